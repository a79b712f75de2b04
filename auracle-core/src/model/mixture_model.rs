use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::alphabet::Alphabet;
use super::associator::Associator;
use super::context::Strategy;
use super::state::Symbol;

/// A weighted mixture of associators sharing one alphabet.
///
/// The first associator is always a `Random` baseline with a positive
/// weight, so every context has a non-empty, positive-total distribution.
/// Each associator's weight is applied at learn time; composing the
/// mixture is a plain union of their stored weights.
///
/// # Responsibilities
/// - Own the associators (they never share memory)
/// - Sample the next symbol after a word prefix
/// - Report the probability of a symbol after a word prefix
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MixtureModel {
	alphabet: Alphabet,
	associators: Vec<Associator>,
}

impl MixtureModel {
	/// Creates a model holding only the baseline associator.
	///
	/// # Errors
	/// Returns an error if `baseline_weight` is 0 or above
	/// [`MAX_WEIGHT`](super::associator::MAX_WEIGHT).
	pub fn new(alphabet: Alphabet, baseline_weight: u64) -> Result<Self> {
		let baseline = Associator::new(Strategy::Random, alphabet.clone(), baseline_weight)?;
		Ok(Self { alphabet, associators: vec![baseline] })
	}

	/// Appends an associator using the model's alphabet.
	///
	/// A `Random` strategy adds a second baseline (it never learns).
	///
	/// # Errors
	/// Returns an error if `weight` is out of range; the model is unchanged.
	pub fn push(&mut self, strategy: Strategy, weight: u64) -> Result<()> {
		self.associators.push(Associator::new(strategy, self.alphabet.clone(), weight)?);
		Ok(())
	}

	/// Builder form of [`MixtureModel::push`].
	pub fn with(mut self, strategy: Strategy, weight: u64) -> Result<Self> {
		self.push(strategy, weight)?;
		Ok(self)
	}

	pub fn alphabet(&self) -> &Alphabet {
		&self.alphabet
	}

	pub fn associators(&self) -> &[Associator] {
		&self.associators
	}

	/// Indices of the associators that accumulate memory.
	pub fn learners(&self) -> Vec<usize> {
		self.associators
			.iter()
			.enumerate()
			.filter(|(_, a)| a.learns())
			.map(|(i, _)| i)
			.collect()
	}

	pub fn learn_with(&mut self, index: usize, word: &str) {
		if let Some(associator) = self.associators.get_mut(index) {
			associator.learn(word);
		}
	}

	pub fn unlearn_with(&mut self, index: usize, word: &str) {
		if let Some(associator) = self.associators.get_mut(index) {
			associator.unlearn(word);
		}
	}

	/// Learns `word` with every learning associator.
	pub fn learn(&mut self, word: &str) {
		for associator in &mut self.associators {
			associator.learn(word);
		}
	}

	/// Inverse of [`MixtureModel::learn`].
	pub fn unlearn(&mut self, word: &str) {
		for associator in &mut self.associators {
			associator.unlearn(word);
		}
	}

	/// Combined distribution after `stimulus`, summed over associators.
	pub fn distribution(&self, stimulus: &str) -> BTreeMap<Symbol, u64> {
		let prefix = Alphabet::normalize(stimulus);
		let mut combined = BTreeMap::new();
		for state in self.associators.iter().filter_map(|a| a.possibilities(&prefix)) {
			for (next, weight) in state.iter() {
				*combined.entry(next).or_insert(0) += weight;
			}
		}
		combined
	}

	/// Samples the next symbol after `stimulus`.
	///
	/// Walks associators in order, accumulating weight until the running sum
	/// exceeds a uniform draw in `[0, total)`.
	pub fn predict<R: Rng + ?Sized>(&self, stimulus: &str, rng: &mut R) -> Symbol {
		self.predict_after(&Alphabet::normalize(stimulus), rng)
	}

	/// Same as [`MixtureModel::predict`] on an already normalized prefix.
	pub(crate) fn predict_after<R: Rng + ?Sized>(&self, prefix: &[char], rng: &mut R) -> Symbol {
		let states: Vec<_> = self.associators.iter().filter_map(|a| a.possibilities(prefix)).collect();
		let total: u64 = states.iter().map(|s| s.total()).sum();
		debug_assert!(total > 0, "baseline guarantees a positive total");

		let draw = rng.random_range(0..total.max(1));
		let mut so_far = 0;
		for state in &states {
			for (next, weight) in state.iter() {
				so_far += weight;
				if so_far > draw {
					return next;
				}
			}
		}
		Symbol::End
	}

	/// Probability of `response` after `stimulus`: matching weight over
	/// total weight, across all associators.
	pub fn probability(&self, stimulus: &str, response: Symbol) -> f64 {
		let prefix = Alphabet::normalize(stimulus);
		let (matching, total) = self.weights(&prefix, response);
		matching as f64 / total as f64
	}

	/// Same as [`MixtureModel::probability`] on an already normalized prefix.
	pub(crate) fn probability_of(&self, prefix: &[char], response: Symbol) -> f64 {
		let (matching, total) = self.weights(prefix, response);
		matching as f64 / total as f64
	}

	fn weights(&self, prefix: &[char], response: Symbol) -> (u64, u64) {
		self.associators
			.iter()
			.filter_map(|a| a.possibilities(prefix))
			.fold((0, 0), |(matching, total), state| {
				(matching + state.weight(response), total + state.total())
			})
	}
}
