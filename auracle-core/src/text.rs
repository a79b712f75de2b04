//! Text normalization and orthography heuristics.

/// Characters kept by [`sanitize`] besides `a`–`z`.
const EXTRA_LETTERS: &str = "'ßäöüáéíóúāēīōūñ-";

fn is_allowed(c: char) -> bool {
	c.is_ascii_lowercase() || EXTRA_LETTERS.contains(c)
}

/// Lower-cases `input`, turns `’` into `'` and collapses every run of
/// characters outside the accented-Latin allow-list into one space.
pub fn sanitize(input: &str) -> String {
	let lowered = input.to_lowercase().replace('’', "'");
	let mut output = String::with_capacity(lowered.len());
	let mut in_run = false;
	for c in lowered.chars() {
		if is_allowed(c) {
			output.push(c);
			in_run = false;
		} else if !in_run {
			output.push(' ');
			in_run = true;
		}
	}
	output
}

/// Infers the vowel inventory of sanitized `input`.
pub fn orthography(input: &str) -> String {
	vowel_inventory(&sanitize(input))
}

fn has_any(text: &str, set: &str) -> bool {
	text.chars().any(|c| set.contains(c))
}

fn base_vowel_system(text: &str) -> &'static str {
	let mid_vowels = has_any(text, "eo");
	if text.contains('ä') && !mid_vowels {
		"aiuäü"
	} else if text.contains('ü') && !mid_vowels {
		"aiueü"
	} else if has_any(text, "äöü") {
		"aeiouöüä"
	} else if has_any(text, "eoéóēōèòêôẽõ") {
		"aeiou"
	} else {
		"aiu"
	}
}

/// Infers a plausible vowel inventory from the letters present in `text`.
///
/// Starts from a three-vowel (`aiu`), five-vowel or umlaut system, treats
/// `y` and `w` as vowels when present, then adds the acute, macron, grave,
/// circumflex and tilde series of the vowels found so far whenever one of
/// those diacritics appears.
pub fn vowel_inventory(text: &str) -> String {
	let mut vowels = base_vowel_system(text).to_owned();
	if has_any(text, "yýȳỳŷỹ") {
		vowels.push('y');
	}
	if has_any(text, "wẃẁŵ") {
		vowels.push('w');
	}
	let diacritics: [(&str, fn(char) -> Option<char>); 5] = [
		("áéíóúýẃ", acute),
		("āēīōūȳ", macron),
		("àèìòùỳẁ", grave),
		("âêîôûŷŵ", circumflex),
		("ãẽĩõũỹ", tilde),
	];
	for (marks, add_mark) in diacritics {
		if has_any(text, marks) {
			let marked: String = vowels.chars().filter_map(add_mark).collect();
			vowels.push_str(&marked);
		}
	}
	vowels
}

fn acute(v: char) -> Option<char> {
	match v {
		'a' => Some('á'),
		'e' => Some('é'),
		'i' => Some('í'),
		'o' => Some('ó'),
		'u' => Some('ú'),
		'y' => Some('ý'),
		'w' => Some('ẃ'),
		_ => None,
	}
}

fn macron(v: char) -> Option<char> {
	match v {
		'a' => Some('ā'),
		'e' => Some('ē'),
		'i' => Some('ī'),
		'o' => Some('ō'),
		'u' => Some('ū'),
		'y' => Some('ȳ'),
		_ => None,
	}
}

fn grave(v: char) -> Option<char> {
	match v {
		'a' => Some('à'),
		'e' => Some('è'),
		'i' => Some('ì'),
		'o' => Some('ò'),
		'u' => Some('ù'),
		'y' => Some('ỳ'),
		'w' => Some('ẁ'),
		_ => None,
	}
}

fn circumflex(v: char) -> Option<char> {
	match v {
		'a' => Some('â'),
		'e' => Some('ê'),
		'i' => Some('î'),
		'o' => Some('ô'),
		'u' => Some('û'),
		'y' => Some('ŷ'),
		'w' => Some('ŵ'),
		_ => None,
	}
}

fn tilde(v: char) -> Option<char> {
	match v {
		'a' => Some('ã'),
		'e' => Some('ẽ'),
		'i' => Some('ĩ'),
		'o' => Some('õ'),
		'u' => Some('ũ'),
		'y' => Some('ỹ'),
		_ => None,
	}
}
