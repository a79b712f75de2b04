use serde::{Deserialize, Serialize};

use crate::error::{AuracleError, Result};

/// The default alphabet: lowercase ASCII letters.
pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Set of characters an associator may predict.
///
/// Characters are lower-cased on construction and kept sorted, so
/// iteration order is stable.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
	chars: Vec<char>,
}

impl Alphabet {
	/// Creates an alphabet from the characters of `letters`.
	///
	/// # Errors
	/// Returns an error if no character remains after normalization.
	pub fn new(letters: &str) -> Result<Self> {
		let mut chars: Vec<char> = letters
			.chars()
			.filter(|c| !c.is_whitespace())
			.flat_map(|c| c.to_lowercase())
			.collect();
		chars.sort_unstable();
		chars.dedup();
		if chars.is_empty() {
			return Err(AuracleError::validation("Alphabet cannot be empty"));
		}
		Ok(Self { chars })
	}

	pub fn contains(&self, c: char) -> bool {
		self.chars.binary_search(&c).is_ok()
	}

	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
		self.chars.iter().copied()
	}

	/// Lower-cases `text` into a character buffer.
	pub fn normalize(text: &str) -> Vec<char> {
		text.chars().flat_map(|c| c.to_lowercase()).collect()
	}
}

impl Default for Alphabet {
	fn default() -> Self {
		Self {
			chars: DEFAULT_ALPHABET.chars().collect(),
		}
	}
}
