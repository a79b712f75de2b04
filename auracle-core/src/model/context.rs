use serde::{Deserialize, Serialize};

/// Left padding used when the word so far is shorter than the context.
pub const BOUNDARY: char = '#';

/// Consonant/vowel class of a character.
///
/// `V` vowel, `K` voiceless stop, `G` voiced stop, `L` liquid,
/// `S` sibilant, `H` laryngeal, `C` any other consonant.
pub fn cv_class(c: char) -> char {
	match c {
		'a' | 'e' | 'i' | 'o' | 'u' | 'y' => 'V',
		'p' | 't' | 'c' | 'k' | 'q' => 'K',
		'd' | 'b' | 'g' => 'G',
		'l' | 'r' => 'L',
		's' | 'z' => 'S',
		'h' => 'H',
		_ => 'C',
	}
}

fn is_vowel(c: char) -> bool {
	cv_class(c) == 'V'
}

/// How an associator derives its context key from the word so far.
///
/// Every strategy is total: a prefix shorter than the context width yields
/// a padded or truncated key, never an error.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
	/// Non-learning baseline; its key is always empty.
	Random,
	/// The last `n` raw characters.
	#[serde(rename = "ngram")]
	NGram { n: usize },
	/// The last `n` characters mapped through [`cv_class`].
	ConsonantVowel { n: usize },
	/// The suffix spanning `n` vowel/consonant segments.
	Segment { n: usize },
}

impl Strategy {
	/// Computes the context key for `prefix`.
	pub fn key(&self, prefix: &[char]) -> String {
		match *self {
			Strategy::Random => String::new(),
			Strategy::NGram { n } => left_padded(prefix, n, |c| c),
			Strategy::ConsonantVowel { n } => left_padded(prefix, n, cv_class),
			Strategy::Segment { n } => segment_suffix(prefix, n),
		}
	}

	/// Whether associators using this strategy accumulate memory.
	pub fn learns(&self) -> bool {
		!matches!(self, Strategy::Random)
	}
}

/// Last `n` characters of `prefix`, mapped, then left-padded with `#`.
fn left_padded(prefix: &[char], n: usize, map: impl Fn(char) -> char) -> String {
	let start = prefix.len().saturating_sub(n);
	let tail = &prefix[start..];
	let mut key = String::with_capacity(n);
	for _ in tail.len()..n {
		key.push(BOUNDARY);
	}
	key.extend(tail.iter().map(|c| map(*c)));
	key
}

/// Scans right to left, counting vowel/consonant class changes, and stops
/// before the character that would cross the `n`th boundary.
fn segment_suffix(prefix: &[char], n: usize) -> String {
	if n == 0 {
		return String::new();
	}
	let mut start = prefix.len();
	let mut boundaries = 0;
	let mut previous: Option<bool> = None;
	while start > 0 {
		let vowel = is_vowel(prefix[start - 1]);
		if let Some(p) = previous {
			if p != vowel {
				boundaries += 1;
				if boundaries == n {
					break;
				}
			}
		}
		previous = Some(vowel);
		start -= 1;
	}
	prefix[start..].iter().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chars(s: &str) -> Vec<char> {
		s.chars().collect()
	}

	#[test]
	fn test_ngram_pads_short_prefixes() {
		let bigram = Strategy::NGram { n: 2 };
		assert_eq!(bigram.key(&chars("")), "##");
		assert_eq!(bigram.key(&chars("f")), "#f");
		assert_eq!(bigram.key(&chars("foo")), "oo");
		assert_eq!(Strategy::NGram { n: 0 }.key(&chars("foo")), "");
	}

	#[test]
	fn test_cv_classes() {
		for c in "aeiouy".chars() {
			assert_eq!(cv_class(c), 'V');
		}
		for c in "ptckq".chars() {
			assert_eq!(cv_class(c), 'K');
		}
		for c in "dbg".chars() {
			assert_eq!(cv_class(c), 'G');
		}
		assert_eq!(cv_class('l'), 'L');
		assert_eq!(cv_class('r'), 'L');
		assert_eq!(cv_class('s'), 'S');
		assert_eq!(cv_class('z'), 'S');
		assert_eq!(cv_class('h'), 'H');
		assert_eq!(cv_class('m'), 'C');
		assert_eq!(cv_class('ñ'), 'C');
	}

	#[test]
	fn test_cv_key_maps_before_padding() {
		let cv = Strategy::ConsonantVowel { n: 3 };
		assert_eq!(cv.key(&chars("ba")), "#GV");
		assert_eq!(cv.key(&chars("strap")), "LVK");
	}

	#[test]
	fn test_segment_key() {
		assert_eq!(Strategy::Segment { n: 2 }.key(&chars("bac")), "ac");
		assert_eq!(Strategy::Segment { n: 3 }.key(&chars("baccaa")), "accaa");
		assert_eq!(Strategy::Segment { n: 5 }.key(&chars("bac")), "bac");
		assert_eq!(Strategy::Segment { n: 1 }.key(&chars("")), "");
		assert_eq!(Strategy::Segment { n: 0 }.key(&chars("bac")), "");
	}

	#[test]
	fn test_random_key_is_constant() {
		assert_eq!(Strategy::Random.key(&chars("anything")), "");
		assert!(!Strategy::Random.learns());
	}
}
