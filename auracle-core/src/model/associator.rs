use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AuracleError, Result};

use super::alphabet::Alphabet;
use super::context::Strategy;
use super::state::{State, Symbol};

/// Multiplier applied to the baseline's end-of-word weight, biasing
/// generation against runaway word length.
pub const BASELINE_END_FACTOR: u64 = 4;

/// Largest weight an associator accepts. State totals stay far from
/// `u64::MAX` for any realistic number of observations.
pub const MAX_WEIGHT: u64 = 1 << 24;

/// A learnable mapping from context key to a weighted next-symbol
/// distribution, using one context [`Strategy`].
///
/// ## Invariants
/// - `memory` contains no empty state and no zero weight
/// - `unlearn(w)` right after `learn(w)` restores `memory` exactly
/// - A `Random` associator never changes after construction
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Associator {
	strategy: Strategy,
	alphabet: Alphabet,
	/// Weight added per observation.
	weight: u64,
	/// Context key -> next-symbol weights.
	memory: BTreeMap<String, State>,
}

impl Associator {
	/// Creates an associator with empty memory.
	///
	/// The `Random` strategy is seeded with `weight` per alphabet character
	/// and `4 * weight` for the end-of-word marker.
	///
	/// # Errors
	/// Returns an error if `weight` is 0 or above [`MAX_WEIGHT`].
	pub fn new(strategy: Strategy, alphabet: Alphabet, weight: u64) -> Result<Self> {
		if weight == 0 || weight > MAX_WEIGHT {
			return Err(AuracleError::validation(format!(
				"Associator weight must be between 1 and {}, got {}",
				MAX_WEIGHT, weight
			)));
		}
		let mut memory = BTreeMap::new();
		if !strategy.learns() {
			let mut baseline = State::new();
			for c in alphabet.iter() {
				baseline.add(Symbol::Char(c), weight);
			}
			baseline.add(Symbol::End, weight * BASELINE_END_FACTOR);
			if !baseline.is_empty() {
				memory.insert(String::new(), baseline);
			}
		}
		Ok(Self { strategy, alphabet, weight, memory })
	}

	pub fn strategy(&self) -> Strategy {
		self.strategy
	}

	pub fn weight(&self) -> u64 {
		self.weight
	}

	pub fn learns(&self) -> bool {
		self.strategy.learns()
	}

	pub fn memory(&self) -> &BTreeMap<String, State> {
		&self.memory
	}

	/// Adds this associator's weight for every position of `word`,
	/// including the terminal end-of-word position.
	///
	/// Characters outside the alphabet are skipped.
	pub fn learn(&mut self, word: &str) {
		if !self.learns() {
			return;
		}
		let chars = Alphabet::normalize(word);
		let observations: Vec<_> = self.observations(&chars).collect();
		for (key, next) in observations {
			self.memory.entry(key).or_default().add(next, self.weight);
		}
	}

	/// Exact inverse of [`Associator::learn`] for the same word.
	///
	/// Zero weights and emptied contexts are deleted.
	pub fn unlearn(&mut self, word: &str) {
		if !self.learns() {
			return;
		}
		let chars = Alphabet::normalize(word);
		let observations: Vec<_> = self.observations(&chars).collect();
		for (key, next) in observations {
			let Some(state) = self.memory.get_mut(&key) else {
				warn!("Unlearning {:?} from unknown context {:?}", word, key);
				continue;
			};
			if !state.remove(next, self.weight) {
				warn!("Unlearning {:?} removed more than was learned in {:?}", word, key);
			}
			if state.is_empty() {
				self.memory.remove(&key);
			}
		}
	}

	/// Returns the distribution stored for the context of `prefix`.
	pub fn possibilities(&self, prefix: &[char]) -> Option<&State> {
		self.memory.get(&self.strategy.key(prefix))
	}

	/// Context key and target symbol for every position of `chars`.
	fn observations<'a>(&'a self, chars: &'a [char]) -> impl Iterator<Item = (String, Symbol)> + 'a {
		(0..=chars.len()).filter_map(move |i| {
			let next = match chars.get(i) {
				Some(c) if self.alphabet.contains(*c) => Symbol::Char(*c),
				Some(_) => return None,
				None => Symbol::End,
			};
			Some((self.strategy.key(&chars[..i]), next))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ngram(n: usize) -> Associator {
		Associator::new(Strategy::NGram { n }, Alphabet::default(), 1).unwrap()
	}

	#[test]
	fn test_bigram_learns_foo() {
		let mut associator = ngram(2);
		associator.learn("foo");

		let memory = associator.memory();
		assert_eq!(memory.len(), 4);
		assert_eq!(memory["##"].weight(Symbol::Char('f')), 1);
		assert_eq!(memory["#f"].weight(Symbol::Char('o')), 1);
		assert_eq!(memory["fo"].weight(Symbol::Char('o')), 1);
		assert_eq!(memory["oo"].weight(Symbol::End), 1);
		for state in memory.values() {
			assert_eq!(state.total(), 1);
		}
	}

	#[test]
	fn test_unlearn_inverts_learn() {
		let strategies = [
			Strategy::NGram { n: 0 },
			Strategy::NGram { n: 3 },
			Strategy::ConsonantVowel { n: 2 },
			Strategy::Segment { n: 2 },
		];
		for strategy in strategies {
			let mut associator = Associator::new(strategy, Alphabet::default(), 3).unwrap();
			associator.learn("banana");
			associator.learn("bandana");
			let before = associator.clone();

			associator.learn("cabana");
			associator.unlearn("cabana");
			assert_eq!(associator, before, "{:?}", strategy);

			associator.unlearn("bandana");
			associator.unlearn("banana");
			assert!(associator.memory().is_empty(), "{:?}", strategy);
		}
	}

	#[test]
	fn test_characters_outside_alphabet_are_skipped() {
		let mut associator = Associator::new(Strategy::NGram { n: 1 }, Alphabet::new("ab").unwrap(), 1).unwrap();
		associator.learn("abc");
		let memory = associator.memory();
		assert_eq!(memory["#"].weight(Symbol::Char('a')), 1);
		assert_eq!(memory["a"].weight(Symbol::Char('b')), 1);
		assert!(!memory.contains_key("b"));
		assert_eq!(memory["c"].weight(Symbol::End), 1);
	}

	#[test]
	fn test_learning_is_case_insensitive() {
		let mut associator = ngram(1);
		associator.learn("Ab");
		associator.unlearn("aB");
		assert!(associator.memory().is_empty());
	}

	#[test]
	fn test_random_baseline() {
		let mut associator = Associator::new(Strategy::Random, Alphabet::new("abc").unwrap(), 2).unwrap();
		let before = associator.clone();
		associator.learn("abc");
		associator.unlearn("a");
		assert_eq!(associator, before);

		let state = associator.possibilities(&['x', 'y']).unwrap();
		assert_eq!(state.weight(Symbol::Char('b')), 2);
		assert_eq!(state.weight(Symbol::End), 8);
		assert_eq!(state.total(), 14);
	}

	#[test]
	fn test_weight_must_be_in_range() {
		for weight in [0, MAX_WEIGHT + 1, u64::MAX / 2] {
			for strategy in [Strategy::Random, Strategy::NGram { n: 2 }] {
				assert!(matches!(
					Associator::new(strategy, Alphabet::default(), weight),
					Err(AuracleError::Validation(_))
				));
			}
		}
		let heaviest = Associator::new(Strategy::Random, Alphabet::default(), MAX_WEIGHT).unwrap();
		assert_eq!(heaviest.possibilities(&[]).unwrap().total(), MAX_WEIGHT * 30);
	}

	#[test]
	fn test_possibilities_for_unknown_context() {
		let associator = ngram(2);
		assert!(associator.possibilities(&['z']).is_none());
	}
}
