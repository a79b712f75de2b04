use serde::{Deserialize, Serialize};

/// Order in which accepted candidates are returned.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
	/// Lowest expectedness first.
	#[default]
	MostSurprising,
	/// Highest expectedness first.
	MostTypical,
}

/// Parameters for word generation.
///
/// # Invariants
/// - `attempts >= 1`
/// - `threshold` is finite
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GenerateOptions {
	/// Number of independent candidates sampled.
	attempts: usize,

	/// Candidates scoring at or below this expectedness are dropped.
	threshold: f64,

	/// Maximum number of words returned (`None` keeps all).
	pub limit: Option<usize>,

	pub ordering: Ordering,
}

impl Default for GenerateOptions {
	fn default() -> Self {
		Self {
			attempts: 500,
			threshold: -1.0,
			limit: None,
			ordering: Ordering::MostSurprising,
		}
	}
}

impl GenerateOptions {
	pub fn attempts(&self) -> usize {
		self.attempts
	}

	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// # Errors
	/// Returns an error if `attempts` is 0.
	pub fn set_attempts(&mut self, attempts: usize) -> Result<(), String> {
		if attempts == 0 {
			return Err("Attempts must be at least 1".to_owned());
		}
		self.attempts = attempts;
		Ok(())
	}

	/// # Errors
	/// Returns an error if `threshold` is NaN or infinite.
	pub fn set_threshold(&mut self, threshold: f64) -> Result<(), String> {
		if !threshold.is_finite() {
			return Err("Threshold must be a finite number".to_owned());
		}
		self.threshold = threshold;
		Ok(())
	}

	/// Checks invariants that deserialization can bypass.
	pub fn validate(&self) -> Result<(), String> {
		if self.attempts == 0 {
			return Err("Attempts must be at least 1".to_owned());
		}
		if !self.threshold.is_finite() {
			return Err("Threshold must be a finite number".to_owned());
		}
		Ok(())
	}
}
