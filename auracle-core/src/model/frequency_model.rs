use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AuracleError, Result};
use crate::io::{read_to_string, snapshot_path};
use super::context::BOUNDARY;
use super::state::{State, Symbol};

/// Laplace smoothing added to every count.
pub const LAPLACE_SMOOTHING: f64 = 1.0;

/// Pseudo-vocabulary size added to a context's total so that an unseen
/// context never beats a seen one (an empty model is not a "best fit").
pub const SMOOTHING_VOCABULARY: f64 = 30.0;

/// Immutable fixed-order character model built from a static corpus.
///
/// Each word is padded with `order` boundary markers `#` on both sides;
/// every window of `order` characters maps to the character that follows
/// it. A following `#` is stored as [`Symbol::End`].
///
/// # Invariants
/// - `order >= 1`
/// - Every context key is exactly `order` characters long
/// - `total_observations` is the sum of all state totals
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FrequencyModel {
	order: usize,
	states: BTreeMap<String, State>,
	/// Word length -> number of words of that length.
	lengths: BTreeMap<usize, u64>,
	total_observations: u64,
}

/// Accumulates one or more corpora into a [`FrequencyModel`].
#[derive(Clone, Debug)]
pub struct FrequencyModelBuilder {
	model: FrequencyModel,
}

impl FrequencyModelBuilder {
	/// # Errors
	/// Returns an error if `order` is 0.
	pub fn new(order: usize) -> Result<Self> {
		if order == 0 {
			return Err(AuracleError::validation("Model order must be >= 1"));
		}
		Ok(Self {
			model: FrequencyModel {
				order,
				states: BTreeMap::new(),
				lengths: BTreeMap::new(),
				total_observations: 0,
			},
		})
	}

	/// Adds every whitespace-separated word of `text`.
	pub fn feed(mut self, text: &str) -> Self {
		for word in text.split_whitespace() {
			self.model.add_word(word);
		}
		self
	}

	pub fn build(self) -> FrequencyModel {
		self.model
	}
}

/// Builds a frequency model of the given order from raw text.
pub fn build_model(text: &str, order: usize) -> Result<FrequencyModel> {
	Ok(FrequencyModelBuilder::new(order)?.feed(text).build())
}

impl FrequencyModel {
	/// Loads a model from a corpus file, using a binary snapshot if one
	/// exists next to it with the same order.
	///
	/// - `corpus.txt` is cached as `corpus.bin` (postcard)
	/// - A snapshot of another order is rebuilt and overwritten
	pub fn load<P: AsRef<Path>>(filepath: P, order: usize) -> Result<Self> {
		let binary_data_path = snapshot_path(&filepath)?;
		if binary_data_path.exists() {
			let bytes = std::fs::read(&binary_data_path)?;
			let model: FrequencyModel = postcard::from_bytes(&bytes)?;
			if model.order == order {
				return Ok(model);
			}
			info!("Snapshot {} has order {}, rebuilding", binary_data_path.display(), model.order);
		}

		let model = build_model(&read_to_string(&filepath)?, order)?;
		let bytes = postcard::to_stdvec(&model)?;
		std::fs::write(&binary_data_path, bytes)?;
		info!(
			"Built order-{} model from {} ({} observations)",
			order,
			filepath.as_ref().display(),
			model.total_observations
		);
		Ok(model)
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn lengths(&self) -> &BTreeMap<usize, u64> {
		&self.lengths
	}

	pub fn total_observations(&self) -> u64 {
		self.total_observations
	}

	pub fn is_empty(&self) -> bool {
		self.total_observations == 0
	}

	/// Raw count of `next` after `context`.
	pub fn count(&self, context: &str, next: Symbol) -> u64 {
		self.states.get(context).map(|s| s.weight(next)).unwrap_or(0)
	}

	/// Laplace-smoothed conditional probability of `next` after `context`.
	///
	/// Strictly positive for every context/symbol pair.
	pub fn probability(&self, context: &str, next: Symbol) -> f64 {
		let total = self.states.get(context).map(|s| s.total()).unwrap_or(0);
		(self.count(context, next) as f64 + LAPLACE_SMOOTHING)
			/ (total as f64 + LAPLACE_SMOOTHING * SMOOTHING_VOCABULARY)
	}

	/// Laplace-smoothed probability of a word of `len` characters.
	///
	/// Returns 1 when no word was observed.
	pub fn length_probability(&self, len: usize) -> f64 {
		let total: f64 = self.lengths.values().map(|c| *c as f64 + LAPLACE_SMOOTHING).sum();
		if total == 0.0 {
			return 1.0;
		}
		(self.lengths.get(&len).copied().unwrap_or(0) as f64 + LAPLACE_SMOOTHING) / total
	}

	/// Samples the symbol following `word` from the raw counts.
	///
	/// # Errors
	/// Returns an error if the context was never observed.
	pub fn sample_next<R: Rng + ?Sized>(&self, word: &[char], rng: &mut R) -> Result<(Symbol, f64)> {
		let context = self.context(word);
		self.states
			.get(&context)
			.and_then(|state| state.sample(rng))
			.ok_or(AuracleError::UnknownContext(context))
	}

	/// The `order` characters preceding the end of `word`, boundary padded.
	pub fn context(&self, word: &[char]) -> String {
		let start = word.len().saturating_sub(self.order);
		let mut context: String = std::iter::repeat_n(BOUNDARY, self.order - (word.len() - start)).collect();
		context.extend(&word[start..]);
		context
	}

	/// Every (context, next) window of a padded word.
	pub(crate) fn windows(&self, word: &str) -> Vec<(String, Symbol)> {
		let padding = std::iter::repeat_n(BOUNDARY, self.order);
		let padded: Vec<char> = padding.clone().chain(word.chars()).chain(padding).collect();
		(self.order..padded.len())
			.map(|i| {
				let context: String = padded[i - self.order..i].iter().collect();
				let next = match padded[i] {
					BOUNDARY => Symbol::End,
					c => Symbol::Char(c),
				};
				(context, next)
			})
			.collect()
	}

	fn add_word(&mut self, word: &str) {
		for (context, next) in self.windows(word) {
			self.states.entry(context).or_default().add(next, 1);
			self.total_observations += 1;
		}
		*self.lengths.entry(word.chars().count()).or_insert(0) += 1;
	}

	/// Serializes to the single-line wire format:
	/// `{"<context>": {"<char>": count}, "$order": n, "$lengths": {...}, "$totalObservations": n}`
	pub fn to_json(&self) -> Result<String> {
		let table = self
			.states
			.iter()
			.map(|(context, state)| {
				let counts = state.iter().map(|(next, count)| (wire_symbol(next), count)).collect();
				(context.clone(), counts)
			})
			.collect();
		let wire = WireModel {
			order: Some(self.order),
			lengths: Some(self.lengths.iter().map(|(len, count)| (len.to_string(), *count)).collect()),
			total_observations: Some(self.total_observations),
			table,
		};
		Ok(serde_json::to_string(&wire)?)
	}

	/// Parses the wire format.
	///
	/// # Errors
	/// Returns `MalformedModel` when `$order` or `$lengths` is missing or
	/// any entry is inconsistent with the order.
	pub fn from_json(input: &str) -> Result<Self> {
		let wire: WireModel = serde_json::from_str(input).map_err(|e| AuracleError::malformed(e.to_string()))?;
		let order = match wire.order {
			Some(0) => return Err(AuracleError::malformed("$order must be >= 1")),
			Some(order) => order,
			None => return Err(AuracleError::malformed("missing $order")),
		};
		let Some(wire_lengths) = wire.lengths else {
			return Err(AuracleError::malformed("missing $lengths"));
		};

		let mut lengths = BTreeMap::new();
		for (len, count) in wire_lengths {
			let len: usize = len
				.parse()
				.map_err(|_| AuracleError::malformed(format!("invalid word length {:?}", len)))?;
			lengths.insert(len, count);
		}

		let mut states = BTreeMap::new();
		let mut observed = 0;
		for (context, counts) in wire.table {
			if context.chars().count() != order {
				return Err(AuracleError::malformed(format!(
					"context {:?} does not match order {}",
					context, order
				)));
			}
			let mut state = State::new();
			for (next, count) in counts {
				let mut chars = next.chars();
				let symbol = match (chars.next(), chars.next()) {
					(Some(BOUNDARY), None) => Symbol::End,
					(Some(c), None) => Symbol::Char(c),
					_ => return Err(AuracleError::malformed(format!("invalid symbol {:?}", next))),
				};
				state.add(symbol, count);
			}
			observed += state.total();
			if !state.is_empty() {
				states.insert(context, state);
			}
		}

		Ok(Self {
			order,
			states,
			lengths,
			total_observations: wire.total_observations.unwrap_or(observed),
		})
	}
}

fn wire_symbol(symbol: Symbol) -> String {
	symbol.as_char().unwrap_or(BOUNDARY).to_string()
}

/// JSON layout of a [`FrequencyModel`]; metadata keys start with `$`.
#[derive(Serialize, Deserialize)]
struct WireModel {
	#[serde(rename = "$order", default, skip_serializing_if = "Option::is_none")]
	order: Option<usize>,
	#[serde(rename = "$lengths", default, skip_serializing_if = "Option::is_none")]
	lengths: Option<BTreeMap<String, u64>>,
	#[serde(rename = "$totalObservations", default, skip_serializing_if = "Option::is_none")]
	total_observations: Option<u64>,
	#[serde(flatten)]
	table: BTreeMap<String, BTreeMap<String, u64>>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_build_counts_padded_windows() {
		let model = build_model("abc ab", 2).unwrap();
		assert_eq!(model.order(), 2);
		assert_eq!(model.count("##", Symbol::Char('a')), 2);
		assert_eq!(model.count("#a", Symbol::Char('b')), 2);
		assert_eq!(model.count("ab", Symbol::Char('c')), 1);
		assert_eq!(model.count("ab", Symbol::End), 1);
		assert_eq!(model.count("bc", Symbol::End), 1);
		assert_eq!(model.count("c#", Symbol::End), 1);
		assert_eq!(model.count("b#", Symbol::End), 1);
		// "##abc##" has 5 windows, "##ab##" has 4
		assert_eq!(model.total_observations(), 9);
		assert_eq!(model.lengths()[&3], 1);
		assert_eq!(model.lengths()[&2], 1);
	}

	#[test]
	fn test_feed_accumulates_corpora() {
		let both = FrequencyModelBuilder::new(2).unwrap().feed("abc").feed("ab").build();
		assert_eq!(both, build_model("abc\nab", 2).unwrap());

		assert_eq!(both.lengths()[&2], 1);
		assert_eq!(both.lengths()[&3], 1);
	}

	#[test]
	fn test_order_zero_is_rejected() {
		assert!(build_model("abc", 0).is_err());
	}

	#[test]
	fn test_smoothed_probability_is_positive() {
		let model = build_model("the cat sat on the mat", 2).unwrap();
		assert!(model.probability("zz", Symbol::Char('q')) > 0.0);
		assert!(model.probability("#t", Symbol::Char('x')) > 0.0);
		assert!(model.probability("#t", Symbol::Char('h')) > model.probability("#t", Symbol::Char('x')));
		assert_eq!(model.probability("zz", Symbol::Char('q')), 1.0 / 30.0);
	}

	#[test]
	fn test_length_probability() {
		let model = build_model("aa bb ccc", 2).unwrap();
		// lengths {2: 2, 3: 1} -> total (2 + 1) + (1 + 1) = 5
		assert_eq!(model.length_probability(2), 3.0 / 5.0);
		assert_eq!(model.length_probability(7), 1.0 / 5.0);
		assert_eq!(build_model("", 2).unwrap().length_probability(4), 1.0);
	}

	#[test]
	fn test_wire_format() {
		let model = build_model("ab", 1).unwrap();
		let json = model.to_json().unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["$order"], 1);
		assert_eq!(value["$lengths"]["2"], 1);
		assert_eq!(value["$totalObservations"], 3);
		assert_eq!(value["#"]["a"], 1);
		assert_eq!(value["a"]["b"], 1);
		assert_eq!(value["b"]["#"], 1);
		assert_eq!(FrequencyModel::from_json(&json).unwrap(), model);
	}

	#[test]
	fn test_missing_metadata_is_malformed() {
		let missing_order = r##"{"$lengths": {"1": 1}, "#": {"a": 1}}"##;
		assert!(matches!(FrequencyModel::from_json(missing_order), Err(AuracleError::MalformedModel(_))));

		let missing_lengths = r##"{"$order": 1, "#": {"a": 1}}"##;
		assert!(matches!(FrequencyModel::from_json(missing_lengths), Err(AuracleError::MalformedModel(_))));

		let wrong_width = r##"{"$order": 2, "$lengths": {}, "#": {"a": 1}}"##;
		assert!(matches!(FrequencyModel::from_json(wrong_width), Err(AuracleError::MalformedModel(_))));
	}

	#[test]
	fn test_total_observations_is_recomputed_when_absent() {
		let legacy = r##"{"$order": 1, "$lengths": {"1": 1}, "#": {"a": 1}, "a": {"#": 1}}"##;
		let model = FrequencyModel::from_json(legacy).unwrap();
		assert_eq!(model.total_observations(), 2);
		assert_eq!(model.count("a", Symbol::End), 1);
	}

	#[test]
	fn test_sample_next_follows_observations() {
		let model = build_model("xy", 2).unwrap();
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(model.sample_next(&[], &mut rng).unwrap(), (Symbol::Char('x'), 1.0));
		assert_eq!(model.sample_next(&['x', 'y'], &mut rng).unwrap(), (Symbol::End, 1.0));
		assert!(matches!(
			build_model("", 2).unwrap().sample_next(&[], &mut rng),
			Err(AuracleError::UnknownContext(_))
		));
	}

	#[test]
	fn test_load_caches_snapshot() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("toy.txt");
		std::fs::write(&corpus, "kala kili\nkulu").unwrap();

		let built = FrequencyModel::load(&corpus, 2).unwrap();
		assert!(dir.path().join("toy.bin").exists());
		assert_eq!(FrequencyModel::load(&corpus, 2).unwrap(), built);

		let rebuilt = FrequencyModel::load(&corpus, 3).unwrap();
		assert_eq!(rebuilt.order(), 3);
	}
}
