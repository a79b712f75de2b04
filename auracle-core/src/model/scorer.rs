use serde::Serialize;

use crate::error::{AuracleError, Result};
use super::frequency_model::FrequencyModel;

/// Average log-probability per character of `text` under `model`.
///
/// Each word is padded with boundary markers and a window of the model's
/// order slides across it; the terminal boundaries are scored too.
///
/// # Errors
/// Returns a validation error if `text` has no words.
pub fn score(text: &str, model: &FrequencyModel) -> Result<f64> {
	let mut log_likelihood = 0.0;
	let mut positions = 0usize;
	for word in text.split_whitespace() {
		for (context, next) in model.windows(word) {
			log_likelihood += model.probability(&context, next).ln();
			positions += 1;
		}
	}
	if positions == 0 {
		return Err(AuracleError::validation("Please enter some text"));
	}
	Ok(log_likelihood / positions as f64)
}

/// Average log-probability above which a text is a good match.
pub const GOOD_MATCH: f64 = -7.0;

/// Average log-probability above which a text is a possible match.
pub const POSSIBLE_MATCH: f64 = -8.0;

/// Verdict for an average log-probability returned by [`score`].
pub fn evaluate(average: f64) -> &'static str {
	if average > GOOD_MATCH {
		"Good match!"
	} else if average > POSSIBLE_MATCH {
		"Possible match"
	} else {
		"Unlikely match"
	}
}

/// One reference model's fit to a text.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Identification {
	pub name: String,
	pub score: f64,
}

/// Scores `text` against every named model, best fit first.
///
/// # Errors
/// Returns a validation error if `text` has no words.
pub fn identify<'a, I>(text: &str, models: I) -> Result<Vec<Identification>>
where
	I: IntoIterator<Item = (&'a str, &'a FrequencyModel)>,
{
	if text.split_whitespace().next().is_none() {
		return Err(AuracleError::validation("Please enter some text"));
	}
	let mut ranked = models
		.into_iter()
		.map(|(name, model)| Ok(Identification { name: name.to_owned(), score: score(text, model)? }))
		.collect::<Result<Vec<_>>>()?;
	ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
	Ok(ranked)
}

/// One `name: score` line per identification.
pub fn format_identifications(ranked: &[Identification]) -> String {
	ranked
		.iter()
		.map(|i| format!("{}: {}", i.name, i.score))
		.collect::<Vec<_>>()
		.join("\n")
}
