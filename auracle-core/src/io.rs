use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a whole text file into a `String`.
pub(crate) fn read_to_string<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Reads a text file and returns its whitespace-separated words, in order.
pub(crate) fn read_words<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	Ok(read_to_string(filename)?.split_whitespace().map(str::to_owned).collect())
}

/// Path of the postcard snapshot cached next to a corpus file.
///
/// `data/corpora/english.txt` → `data/corpora/english.bin`
pub(crate) fn snapshot_path<P: AsRef<Path>>(corpus: P) -> io::Result<PathBuf> {
	let corpus = corpus.as_ref();
	if corpus.file_stem().is_none() {
		return Err(io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no filename"));
	}
	Ok(corpus.with_extension("bin"))
}

/// Name a reference model is registered under: the corpus file stem.
///
/// `./data/corpora/latin.txt` → `latin`
pub(crate) fn model_name<P: AsRef<Path>>(corpus: P) -> io::Result<String> {
	corpus
		.as_ref()
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no filename"))
}

/// Resolves a session data folder; `.` becomes the working directory so
/// log lines show where corpora were read from.
pub(crate) fn resolve_data_dir(input: &Path) -> PathBuf {
	match input.to_str() {
		Some(".") | Some("./") => env::current_dir().unwrap_or_else(|_| input.to_path_buf()),
		_ => input.to_path_buf(),
	}
}

/// Corpus files (`*.<extension>`) of a folder, sorted so reference models
/// are always registered in the same order.
pub(crate) fn corpus_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = fs::read_dir(dir)?
		.map(|entry| entry.map(|e| e.path()))
		.collect::<io::Result<Vec<_>>>()?;
	files.retain(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension));
	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_snapshot_path_and_model_name() {
		let output = snapshot_path("data/corpora/english.txt").unwrap();
		assert_eq!(output, PathBuf::from("data/corpora/english.bin"));
		assert_eq!(model_name("data/corpora/english.txt").unwrap(), "english");
		assert!(snapshot_path("").is_err());
	}

	#[test]
	fn test_corpus_files_filters_extension() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("b.txt"), "x").unwrap();
		fs::write(dir.path().join("a.txt"), "x").unwrap();
		fs::write(dir.path().join("a.bin"), "x").unwrap();
		let files = corpus_files(dir.path(), "txt").unwrap();
		assert_eq!(files, vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);
	}

	#[test]
	fn test_read_words() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("words.txt");
		fs::write(&path, "  alpha beta\n\ngamma ").unwrap();
		assert_eq!(read_words(&path).unwrap(), vec!["alpha", "beta", "gamma"]);
	}
}
