use std::path::PathBuf;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{AuracleError, Result};
use crate::io::{corpus_files, model_name, read_to_string, read_words, resolve_data_dir};
use crate::model::alphabet::{Alphabet, DEFAULT_ALPHABET};
use crate::model::context::Strategy;
use crate::model::frequency_model::FrequencyModel;
use crate::model::generate_options::{GenerateOptions, Ordering};
use crate::model::generator::Generator;
use crate::model::mixture_model::MixtureModel;
use crate::model::scorer::{evaluate, format_identifications, identify, score};
use crate::model::trainer::{QualityMetric, Trainer};
use crate::text;

/// One learning associator of the session model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssociatorConfig {
	pub strategy: Strategy,
	pub weight: u64,
}

/// Configuration of an interactive session.
///
/// Every field has a default, so a partial JSON document is accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
	/// Folder holding the candidate words and the reference corpora.
	pub data_dir: PathBuf,
	/// Candidate training words, relative to `data_dir`.
	pub words_file: String,
	/// Folder of `*.txt` reference corpora, relative to `data_dir`.
	pub corpora_dir: String,
	/// Order of the reference frequency models.
	pub order: usize,
	/// Reference model used by [`Session::score`].
	pub score_model: String,
	pub alphabet: String,
	pub baseline_weight: u64,
	pub associators: Vec<AssociatorConfig>,
	pub metric: QualityMetric,
	/// Shuffle candidate words before each training pass.
	pub shuffle: bool,
	pub generate: GenerateOptions,
	/// Fixed seed for reproducible sessions; entropy when absent.
	pub seed: Option<u64>,
}

impl Default for SessionConfig {
	fn default() -> Self {
		let mut generate = GenerateOptions::default();
		generate.ordering = Ordering::MostTypical;
		generate.limit = Some(25);
		// Literal values, cannot fail.
		let _ = generate.set_attempts(200);
		let _ = generate.set_threshold(-2.5);

		Self {
			data_dir: PathBuf::from("./data"),
			words_file: "words.txt".to_owned(),
			corpora_dir: "corpora".to_owned(),
			order: 2,
			score_model: "english".to_owned(),
			alphabet: DEFAULT_ALPHABET.to_owned(),
			baseline_weight: 1,
			associators: vec![AssociatorConfig { strategy: Strategy::ConsonantVowel { n: 2 }, weight: 1 }],
			metric: QualityMetric::LogLikelihood,
			shuffle: false,
			generate,
			seed: None,
		}
	}
}

impl SessionConfig {
	/// Reads a configuration from a JSON file.
	pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
		Ok(serde_json::from_str(&read_to_string(path)?)?)
	}
}

/// State of one interactive session.
///
/// Constructed once, mutated by [`Session::improve`], read by the other
/// operations. Every operation takes the user's text and returns a string.
#[derive(Debug)]
pub struct Session {
	config: SessionConfig,
	model: MixtureModel,
	words: Vec<String>,
	trainer: Trainer,
	references: Vec<(String, FrequencyModel)>,
	rng: StdRng,
	passes: usize,
}

impl Session {
	/// Creates a session with no candidate words and no reference models.
	///
	/// # Errors
	/// Returns an error if the alphabet, an associator weight (baseline
	/// included) or the generation options are invalid.
	pub fn new(config: SessionConfig) -> Result<Self> {
		config.generate.validate().map_err(AuracleError::Validation)?;
		let mut model = MixtureModel::new(Alphabet::new(&config.alphabet)?, config.baseline_weight)?;
		for associator in &config.associators {
			model.push(associator.strategy, associator.weight)?;
		}
		let rng = match config.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};

		Ok(Self {
			trainer: Trainer::new(config.metric).shuffled(config.shuffle),
			config,
			model,
			words: Vec::new(),
			references: Vec::new(),
			rng,
			passes: 0,
		})
	}

	/// Creates a session and loads its data folder.
	///
	/// - `<data_dir>/<words_file>` provides the candidate words (optional)
	/// - every `<data_dir>/<corpora_dir>/*.txt` becomes a reference model
	///   named after the file
	pub fn open(config: SessionConfig) -> Result<Self> {
		let folder = resolve_data_dir(&config.data_dir);
		if !folder.is_dir() {
			return Err(AuracleError::validation(format!("Expected a directory, got: {}", folder.display())));
		}

		let mut session = Self::new(config)?;

		let words_path = folder.join(&session.config.words_file);
		if words_path.is_file() {
			session.words = read_words(&words_path)?;
			info!("Loaded {} candidate words from {}", session.words.len(), words_path.display());
		} else {
			warn!("No candidate words at {}", words_path.display());
		}

		let corpora = folder.join(&session.config.corpora_dir);
		if corpora.is_dir() {
			for path in corpus_files(&corpora, "txt")? {
				let model = FrequencyModel::load(&path, session.config.order)?;
				session.add_reference(model_name(&path)?, model);
			}
		}
		Ok(session)
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn model(&self) -> &MixtureModel {
		&self.model
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}

	/// Number of training passes run so far.
	pub fn passes(&self) -> usize {
		self.passes
	}

	pub fn set_words(&mut self, words: Vec<String>) {
		self.words = words;
	}

	/// Adds (or replaces) a named reference model.
	pub fn add_reference(&mut self, name: impl Into<String>, model: FrequencyModel) {
		let name = name.into();
		match self.references.iter_mut().find(|(n, _)| *n == name) {
			Some(existing) => existing.1 = model,
			None => self.references.push((name, model)),
		}
	}

	pub fn reference_names(&self) -> Vec<String> {
		self.references.iter().map(|(name, _)| name.clone()).collect()
	}

	/// Runs one training pass against `objective` and returns the accuracy
	/// visualization as HTML.
	pub fn improve(&mut self, objective: &str) -> Result<String> {
		let report = self.trainer.improve(objective, &mut self.model, &self.words, &mut self.rng)?;
		self.passes += 1;
		info!("Training pass {} done, quality {}", self.passes, report.final_quality);
		Ok(report.render_html())
	}

	/// Generates new words from the session model, one per line.
	///
	/// Candidate training words are never echoed back.
	pub fn generate(&mut self) -> Result<String> {
		let generator = Generator::new(self.config.generate.clone()).with_known_words(&self.words);
		let candidates = generator.generate(&self.model, &mut self.rng)?;
		Ok(candidates.into_iter().map(|c| c.word).collect::<Vec<_>>().join("\n"))
	}

	/// Ranks the reference models by how well they fit `input`.
	pub fn identify(&self, input: &str) -> Result<String> {
		let ranked = identify(input, self.references.iter().map(|(name, model)| (name.as_str(), model)))?;
		Ok(format_identifications(&ranked))
	}

	/// Scores `input` against the configured scoring model, followed by a
	/// verdict: `Score = <avg> :: <verdict>`.
	pub fn score(&self, input: &str) -> Result<String> {
		let name = &self.config.score_model;
		let (_, model) = self
			.references
			.iter()
			.find(|(n, _)| n == name)
			.ok_or_else(|| AuracleError::UnknownModel(name.clone()))?;
		let average = score(input, model)?;
		Ok(format!("Score = {} :: {}", average, evaluate(average)))
	}

	pub fn orthography(&self, input: &str) -> String {
		text::orthography(input)
	}

	pub fn sanitize(&self, input: &str) -> String {
		text::sanitize(input)
	}
}
