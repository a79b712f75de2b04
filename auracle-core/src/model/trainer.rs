use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{AuracleError, Result};
use super::alphabet::Alphabet;
use super::mixture_model::MixtureModel;
use super::state::Symbol;

/// Weight of the worst character in [`QualityMetric::WorstCharacterPenalty`].
pub const WORST_CHARACTER_FACTOR: f64 = 5.0;

/// How the trainer scores a model against the objective text.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
	/// Sum of log-probabilities of every position.
	#[default]
	LogLikelihood,
	/// Sum of log-probabilities plus 5 × the lowest one, so a model cannot
	/// win by fitting common characters while missing a distinctive one.
	WorstCharacterPenalty,
}

/// Probability assigned by a model to one position of the objective text.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct CharProbability {
	pub symbol: Symbol,
	pub probability: f64,
}

/// One trial that was kept.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AcceptedTrial {
	pub word: String,
	pub associator: usize,
	pub gain: f64,
}

/// Outcome of a training pass.
#[derive(Serialize, Clone, Debug)]
pub struct TrainingReport {
	pub initial_quality: f64,
	pub final_quality: f64,
	/// Quality after every trial (kept or reverted), in order.
	pub trajectory: Vec<f64>,
	pub accepted: Vec<AcceptedTrial>,
	/// Final per-position probabilities of the objective text.
	pub visualization: Vec<CharProbability>,
}

impl TrainingReport {
	pub fn render_html(&self) -> String {
		render_html(&self.visualization)
	}
}

/// Greedy trial-and-revert search over candidate words.
///
/// For each candidate and each learning associator, the word is learned,
/// the model re-scored, and the change kept only on strict improvement.
/// Because unlearning exactly inverts learning, a rejected trial leaves the
/// model as it was.
#[derive(Clone, Debug, Default)]
pub struct Trainer {
	metric: QualityMetric,
	shuffle: bool,
}

impl Trainer {
	pub fn new(metric: QualityMetric) -> Self {
		Self { metric, shuffle: false }
	}

	/// Shuffle the candidate list before each pass.
	pub fn shuffled(mut self, shuffle: bool) -> Self {
		self.shuffle = shuffle;
		self
	}

	pub fn metric(&self) -> QualityMetric {
		self.metric
	}

	/// Scores `model` against `objective`.
	///
	/// # Errors
	/// Returns a validation error if `objective` has no words.
	pub fn quality(&self, objective: &str, model: &MixtureModel) -> Result<f64> {
		let positions = positions(objective)?;
		let mut sum = 0.0;
		let mut worst = 0.0_f64;
		for (prefix, next) in &positions {
			if let Symbol::Char(c) = next {
				if !model.alphabet().contains(*c) {
					continue;
				}
			}
			let log_probability = model.probability_of(prefix, *next).ln();
			sum += log_probability;
			worst = worst.min(log_probability);
		}
		Ok(match self.metric {
			QualityMetric::LogLikelihood => sum,
			QualityMetric::WorstCharacterPenalty => sum + WORST_CHARACTER_FACTOR * worst,
		})
	}

	/// Runs one pass over `candidates`, mutating `model` in place.
	///
	/// # Errors
	/// Returns a validation error if `objective` has no words.
	pub fn improve<R: Rng + ?Sized>(
		&self,
		objective: &str,
		model: &mut MixtureModel,
		candidates: &[String],
		rng: &mut R,
	) -> Result<TrainingReport> {
		let initial_quality = self.quality(objective, model)?;
		let mut current = initial_quality;
		let mut trajectory = Vec::with_capacity(candidates.len() * model.learners().len());
		let mut accepted = Vec::new();

		let mut order: Vec<&String> = candidates.iter().collect();
		if self.shuffle {
			order.shuffle(rng);
		}

		let learners = model.learners();
		for word in order {
			for &index in &learners {
				model.learn_with(index, word);
				let quality = self.quality(objective, model)?;
				if quality > current {
					debug!("{} +{} (associator {})", word, quality - current, index);
					accepted.push(AcceptedTrial { word: word.clone(), associator: index, gain: quality - current });
					current = quality;
				} else {
					model.unlearn_with(index, word);
				}
				trajectory.push(current);
			}
		}

		info!(
			"Training pass kept {} of {} trials, quality {} -> {}",
			accepted.len(),
			trajectory.len(),
			initial_quality,
			current
		);

		Ok(TrainingReport {
			initial_quality,
			final_quality: current,
			trajectory,
			accepted,
			visualization: visualize(objective, model)?,
		})
	}
}

/// Per-position probabilities of `objective` under `model`, including each
/// word's end-of-word position.
pub fn visualize(objective: &str, model: &MixtureModel) -> Result<Vec<CharProbability>> {
	Ok(positions(objective)?
		.into_iter()
		.map(|(prefix, symbol)| CharProbability { symbol, probability: model.probability_of(&prefix, symbol) })
		.collect())
}

/// Renders probabilities as HTML spans, darker for likelier characters.
/// The end-of-word position is shown as `#`.
pub fn render_html(visualization: &[CharProbability]) -> String {
	let mut html = String::new();
	for position in visualization {
		let text = match position.symbol {
			Symbol::Char('<') => "&lt;".to_owned(),
			Symbol::Char('>') => "&gt;".to_owned(),
			Symbol::Char('&') => "&amp;".to_owned(),
			Symbol::Char(c) => c.to_string(),
			Symbol::End => "#".to_owned(),
		};
		html.push_str(&format!(
			"<span style=\"color: {}\" data-p=\"{}\">{}</span>",
			gray_level(position.probability),
			position.probability,
			text
		));
	}
	html
}

fn gray_level(p: f64) -> &'static str {
	const LEVELS: [(f64, &str); 13] = [
		(0.01, "#ddd"),
		(0.03, "#ccc"),
		(0.05, "#bbb"),
		(0.07, "#aaa"),
		(0.09, "#999"),
		(0.11, "#888"),
		(0.13, "#777"),
		(0.16, "#666"),
		(0.19, "#555"),
		(0.22, "#444"),
		(0.25, "#333"),
		(0.30, "#222"),
		(0.35, "#111"),
	];
	LEVELS
		.iter()
		.find(|(bound, _)| p < *bound)
		.map(|(_, color)| *color)
		.unwrap_or("#000")
}

/// Every (prefix, next symbol) position of every word of `text`.
fn positions(text: &str) -> Result<Vec<(Vec<char>, Symbol)>> {
	let mut positions = Vec::new();
	for word in text.split_whitespace() {
		let chars = Alphabet::normalize(word);
		for i in 0..=chars.len() {
			let next = chars.get(i).map(|c| Symbol::Char(*c)).unwrap_or(Symbol::End);
			positions.push((chars[..i].to_vec(), next));
		}
	}
	if positions.is_empty() {
		return Err(AuracleError::validation("Please enter some text"));
	}
	Ok(positions)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::context::Strategy;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn candidates() -> Vec<String> {
		["kala", "tomato", "kilu", "zzyzx", "kaluki", "strength", "alu", "mauka"]
			.iter()
			.map(|w| w.to_string())
			.collect()
	}

	fn model() -> MixtureModel {
		MixtureModel::new(Alphabet::default(), 1)
			.and_then(|m| m.with(Strategy::ConsonantVowel { n: 2 }, 1))
			.and_then(|m| m.with(Strategy::NGram { n: 1 }, 2))
			.unwrap()
	}

	#[test]
	fn test_empty_objective_is_a_validation_error() {
		let trainer = Trainer::default();
		let mut model = model();
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(trainer.quality("", &model), Err(AuracleError::Validation(_))));
		assert!(matches!(
			trainer.improve("  \n ", &mut model, &candidates(), &mut rng),
			Err(AuracleError::Validation(_))
		));
	}

	#[test]
	fn test_hill_climbing_is_monotonic() {
		for metric in [QualityMetric::LogLikelihood, QualityMetric::WorstCharacterPenalty] {
			let trainer = Trainer::new(metric);
			let mut model = model();
			let mut rng = StdRng::seed_from_u64(3);
			let report = trainer.improve("kaluka lika", &mut model, &candidates(), &mut rng).unwrap();

			let mut previous = report.initial_quality;
			for quality in &report.trajectory {
				assert!(*quality >= previous);
				previous = *quality;
			}
			assert_eq!(report.trajectory.len(), candidates().len() * 2);
			assert!(report.final_quality >= report.initial_quality);
			assert_eq!(report.final_quality, trainer.quality("kaluka lika", &model).unwrap());
			assert!(!report.accepted.is_empty());
		}
	}

	#[test]
	fn test_rejected_trials_leave_model_unchanged() {
		let trainer = Trainer::default();
		let mut model = model();
		let mut rng = StdRng::seed_from_u64(3);
		let rejected = vec!["zzyzx".to_string()];
		let before = model.clone();
		let report = trainer.improve("kala", &mut model, &rejected, &mut rng).unwrap();
		assert!(report.accepted.is_empty());
		assert_eq!(model, before);
	}

	#[test]
	fn test_shuffled_pass_is_still_monotonic() {
		let trainer = Trainer::default().shuffled(true);
		let mut model = model();
		let mut rng = StdRng::seed_from_u64(11);
		let report = trainer.improve("mauka", &mut model, &candidates(), &mut rng).unwrap();
		assert!(report.final_quality >= report.initial_quality);
	}

	#[test]
	fn test_worst_character_penalty() {
		let model = MixtureModel::new(Alphabet::new("ab").unwrap(), 1).unwrap();
		// p(a) = 1/6, p(End) = 4/6
		let plain = Trainer::new(QualityMetric::LogLikelihood).quality("a", &model).unwrap();
		let penalized = Trainer::new(QualityMetric::WorstCharacterPenalty).quality("a", &model).unwrap();
		let expected = (1.0_f64 / 6.0).ln() + (4.0_f64 / 6.0).ln();
		assert!((plain - expected).abs() < 1e-12);
		assert!((penalized - (expected + 5.0 * (1.0_f64 / 6.0).ln())).abs() < 1e-12);
	}

	#[test]
	fn test_characters_outside_alphabet_do_not_poison_quality() {
		let model = MixtureModel::new(Alphabet::new("ab").unwrap(), 1).unwrap();
		let quality = Trainer::default().quality("a!b", &model).unwrap();
		assert!(quality.is_finite());
	}

	#[test]
	fn test_visualization_covers_end_positions() {
		let model = model();
		let visualization = visualize("ab c", &model).unwrap();
		let symbols: Vec<Symbol> = visualization.iter().map(|p| p.symbol).collect();
		assert_eq!(
			symbols,
			vec![Symbol::Char('a'), Symbol::Char('b'), Symbol::End, Symbol::Char('c'), Symbol::End]
		);
		let html = render_html(&visualization);
		assert_eq!(html.matches("<span").count(), 5);
		assert!(html.contains(">#</span>"));
	}

	#[test]
	fn test_gray_levels() {
		assert_eq!(gray_level(0.0), "#ddd");
		assert_eq!(gray_level(0.2), "#444");
		assert_eq!(gray_level(0.9), "#000");
	}
}
