use thiserror::Error;

/// Errors surfaced by the modeling engine.
///
/// Zero-weight sampling has no variant: a `MixtureModel` always carries a
/// positive baseline, so it cannot happen.
#[derive(Error, Debug)]
pub enum AuracleError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// Bad user input (empty objective text, order 0, ...).
	#[error("{0}")]
	Validation(String),

	/// A serialized frequency model lacks metadata or has invalid entries.
	#[error("Malformed model: {0}")]
	MalformedModel(String),

	#[error("No observations for context {0:?}")]
	UnknownContext(String),

	#[error("Model {0} not found")]
	UnknownModel(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),
}

impl AuracleError {
	pub(crate) fn validation(message: impl Into<String>) -> Self {
		AuracleError::Validation(message.into())
	}

	pub(crate) fn malformed(message: impl Into<String>) -> Self {
		AuracleError::MalformedModel(message.into())
	}
}

pub type Result<T> = std::result::Result<T, AuracleError>;
