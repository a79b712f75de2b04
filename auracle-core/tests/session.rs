use std::fs;
use std::path::Path;

use auracle_core::{AuracleError, Session, SessionConfig};

fn write_data(dir: &Path) {
	fs::write(dir.join("words.txt"), "kala\nlika kulu\nstrength\nmauka\nzzyzx\n").unwrap();
	fs::create_dir(dir.join("corpora")).unwrap();
	fs::write(
		dir.join("corpora").join("english.txt"),
		"the quick brown fox jumps over the lazy dog while the others watch",
	)
	.unwrap();
	fs::write(
		dir.join("corpora").join("hawaiian.txt"),
		"aloha mahalo kahuna wiki lani mauna keiki ohana moana kai",
	)
	.unwrap();
}

fn open(dir: &Path) -> Session {
	let config = SessionConfig {
		data_dir: dir.to_path_buf(),
		seed: Some(2024),
		..SessionConfig::default()
	};
	Session::open(config).unwrap()
}

#[test]
fn test_open_loads_words_and_references() {
	let dir = tempfile::tempdir().unwrap();
	write_data(dir.path());
	let session = open(dir.path());

	assert_eq!(session.words().len(), 6);
	assert_eq!(session.reference_names(), vec!["english", "hawaiian"]);
	assert!(dir.path().join("corpora").join("english.bin").exists());

	// second open reads the snapshots
	let again = open(dir.path());
	assert_eq!(again.reference_names(), session.reference_names());
}

#[test]
fn test_identify_and_score() {
	let dir = tempfile::tempdir().unwrap();
	write_data(dir.path());
	let session = open(dir.path());

	let ranked = session.identify("makani ohana").unwrap();
	assert!(ranked.starts_with("hawaiian: "));
	let scored = session.score("the other fox").unwrap();
	assert!(scored.starts_with("Score = "));
	assert!(scored.contains(" :: "));
	assert!(matches!(session.identify("   "), Err(AuracleError::Validation(_))));
}

#[test]
fn test_improve_then_generate() {
	let dir = tempfile::tempdir().unwrap();
	write_data(dir.path());
	let mut session = open(dir.path());
	let untrained = session.model().clone();

	let html = session.improve("kaluka malika").unwrap();
	assert_eq!(html.matches("<span").count(), 14);
	assert_ne!(session.model(), &untrained);

	let generated = session.generate().unwrap();
	let words: Vec<&str> = generated.lines().collect();
	assert!(words.len() <= 25);
	for word in words {
		assert!(word.chars().all(|c| c.is_ascii_lowercase()), "{}", word);
		assert!(!session.words().iter().any(|w| w == word));
	}
}

#[test]
fn test_open_requires_directory() {
	let dir = tempfile::tempdir().unwrap();
	let config = SessionConfig {
		data_dir: dir.path().join("missing"),
		..SessionConfig::default()
	};
	assert!(matches!(Session::open(config), Err(AuracleError::Validation(_))));
}

#[test]
fn test_orthography() {
	let session = Session::new(SessionConfig::default()).unwrap();
	assert_eq!(session.orthography("Kōlā"), "aeiouāēīōū");
}
