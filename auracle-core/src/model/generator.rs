use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use crate::error::{AuracleError, Result};
use super::frequency_model::FrequencyModel;
use super::generate_options::{GenerateOptions, Ordering};
use super::mixture_model::MixtureModel;
use super::state::Symbol;

/// Exponent of the length normalization applied to a word's log-likelihood.
pub const LENGTH_PENALTY_EXPONENT: f64 = 1.5;

/// Weight of the word-length prior in the expectedness score.
pub const LENGTH_PRIOR_WEIGHT: f64 = 0.1;

/// A model words can be sampled from, one symbol at a time.
pub trait WordModel {
	/// Samples the symbol following `word`, with the probability the model
	/// gave it.
	fn sample_next<R: Rng + ?Sized>(&self, word: &[char], rng: &mut R) -> Result<(Symbol, f64)>;

	/// Extra positions counted alongside the characters when normalizing by
	/// length (boundary padding, end-of-word step).
	fn boundary_len(&self) -> usize;

	/// Prior probability of a word of `len` characters, if the model knows one.
	fn length_probability(&self, _len: usize) -> Option<f64> {
		None
	}
}

impl WordModel for MixtureModel {
	fn sample_next<R: Rng + ?Sized>(&self, word: &[char], rng: &mut R) -> Result<(Symbol, f64)> {
		let next = self.predict_after(word, rng);
		Ok((next, self.probability_of(word, next)))
	}

	fn boundary_len(&self) -> usize {
		1
	}
}

impl WordModel for FrequencyModel {
	fn sample_next<R: Rng + ?Sized>(&self, word: &[char], rng: &mut R) -> Result<(Symbol, f64)> {
		FrequencyModel::sample_next(self, word, rng)
	}

	fn boundary_len(&self) -> usize {
		self.order()
	}

	fn length_probability(&self, len: usize) -> Option<f64> {
		Some(FrequencyModel::length_probability(self, len))
	}
}

/// A sampled word and the log-likelihood of the choices that produced it.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct GeneratedWord {
	pub word: String,
	pub log_likelihood: f64,
}

/// An accepted word and its expectedness score.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Candidate {
	pub word: String,
	pub expectedness: f64,
}

/// Samples one word, stopping at the first end-of-word symbol.
pub fn generate_word<M: WordModel, R: Rng + ?Sized>(model: &M, rng: &mut R) -> Result<GeneratedWord> {
	let mut word = Vec::new();
	let mut log_likelihood = 0.0;
	loop {
		let (next, probability) = model.sample_next(&word, rng)?;
		log_likelihood += probability.ln();
		match next {
			Symbol::Char(c) => word.push(c),
			Symbol::End => break,
		}
	}
	Ok(GeneratedWord { word: word.into_iter().collect(), log_likelihood })
}

/// How typical a word is under `model`: length-normalized log-likelihood
/// plus a small length prior.
pub fn expectedness<M: WordModel>(model: &M, generated: &GeneratedWord) -> f64 {
	let len = generated.word.chars().count();
	let normalizer = ((len + model.boundary_len()).max(1) as f64).powf(LENGTH_PENALTY_EXPONENT);
	let prior = model
		.length_probability(len)
		.map(|p| p.ln() * LENGTH_PRIOR_WEIGHT)
		.unwrap_or(0.0);
	generated.log_likelihood / normalizer + prior
}

/// Samples many candidate words and keeps the acceptable, novel ones.
///
/// # Responsibilities
/// - Sample `attempts` independent words
/// - Drop empty words, duplicates, known words and words at or below the threshold
/// - Order by expectedness and truncate
#[derive(Clone, Debug, Default)]
pub struct Generator {
	options: GenerateOptions,
	/// Lower-cased words never returned (typically the training corpus).
	known: HashSet<String>,
}

impl Generator {
	pub fn new(options: GenerateOptions) -> Self {
		Self { options, known: HashSet::new() }
	}

	/// Excludes `words` from the output (case-insensitive).
	pub fn with_known_words<I, S>(mut self, words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.known.extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
		self
	}

	pub fn options(&self) -> &GenerateOptions {
		&self.options
	}

	/// # Errors
	/// Returns an error if the options are invalid or the model cannot be
	/// sampled.
	pub fn generate<M: WordModel, R: Rng + ?Sized>(&self, model: &M, rng: &mut R) -> Result<Vec<Candidate>> {
		self.options.validate().map_err(AuracleError::Validation)?;

		let mut seen = HashSet::new();
		let mut candidates = Vec::new();
		for _ in 0..self.options.attempts() {
			let generated = generate_word(model, rng)?;
			if generated.word.is_empty() {
				continue;
			}
			let score = expectedness(model, &generated);
			if score <= self.options.threshold() {
				continue;
			}
			let lowered = generated.word.to_lowercase();
			if self.known.contains(&lowered) || !seen.insert(lowered) {
				continue;
			}
			candidates.push(Candidate { word: generated.word, expectedness: score });
		}

		match self.options.ordering {
			Ordering::MostSurprising => candidates.sort_by(|a, b| a.expectedness.total_cmp(&b.expectedness)),
			Ordering::MostTypical => candidates.sort_by(|a, b| b.expectedness.total_cmp(&a.expectedness)),
		}
		if let Some(limit) = self.options.limit {
			candidates.truncate(limit);
		}
		Ok(candidates)
	}
}
