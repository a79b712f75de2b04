use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

use serde::{Deserialize, Serialize};

/// A predicted "character": either a real character or the end of the word.
///
/// `End` is a first-class prediction target and takes part in weight
/// accounting exactly like any character.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
	Char(char),
	End,
}

impl Symbol {
	/// Returns the character, or `None` for the end-of-word marker.
	pub fn as_char(&self) -> Option<char> {
		match self {
			Symbol::Char(c) => Some(*c),
			Symbol::End => None,
		}
	}
}

impl From<char> for Symbol {
	fn from(c: char) -> Self {
		Symbol::Char(c)
	}
}

impl fmt::Display for Symbol {
	/// The end-of-word marker displays as the empty string.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Symbol::Char(c) => write!(f, "{}", c),
			Symbol::End => Ok(()),
		}
	}
}

/// Weighted next-symbol distribution observed after one context key.
///
/// Conceptually a node in a Markov chain: outgoing edges are weighted by the
/// accumulated weight of their observations.
///
/// ## Invariants
/// - Every stored weight is strictly positive (zero entries are pruned)
/// - `total` is the sum of all stored weights
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Outgoing transitions in a stable (sorted) order.
	/// Example: { Char('e') => 42, End => 3 }
	transitions: BTreeMap<Symbol, u64>,
	total: u64,
}

impl State {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `weight` to the transition toward `next`.
	pub fn add(&mut self, next: Symbol, weight: u64) {
		if weight == 0 {
			return;
		}
		*self.transitions.entry(next).or_insert(0) += weight;
		self.total += weight;
	}

	/// Removes `weight` from the transition toward `next`.
	///
	/// A transition reaching zero is deleted. Removing more than was added
	/// clamps at zero; returns `false` in that case.
	pub fn remove(&mut self, next: Symbol, weight: u64) -> bool {
		let Some(current) = self.transitions.get_mut(&next) else {
			return weight == 0;
		};
		let removed = weight.min(*current);
		*current -= removed;
		self.total -= removed;
		if *current == 0 {
			self.transitions.remove(&next);
		}
		removed == weight
	}

	/// Weight accumulated toward `next` (0 if never observed).
	pub fn weight(&self, next: Symbol) -> u64 {
		self.transitions.get(&next).copied().unwrap_or(0)
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
		self.transitions.iter().map(|(s, w)| (*s, *w))
	}

	/// Picks the next symbol using weighted random sampling.
	///
	/// Returns the symbol together with its probability.
	/// Returns `None` if the state has no transitions.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Symbol, f64)> {
		if self.total == 0 {
			return None;
		}
		let draw = rng.random_range(0..self.total);
		let mut so_far = 0;
		for (next, weight) in self.iter() {
			so_far += weight;
			if so_far > draw {
				return Some((next, weight as f64 / self.total as f64));
			}
		}
		None
	}
}
