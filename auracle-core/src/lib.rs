//! Character-level generative model of word aesthetics.
//!
//! This crate provides:
//! - Pluggable context strategies and learnable associators
//! - A weighted mixture model with reversible learn/unlearn
//! - A hill-climbing trainer that keeps only strictly improving examples
//! - Word generation, scoring and identification over frequency tables
//! - Text sanitizing and vowel-inventory inference
//!
//! [`session::Session`] ties these together for interactive use.

pub mod error;

/// Models, training, generation and scoring.
pub mod model;

/// Explicit per-user session state (model, corpora, random source).
pub mod session;

/// Sanitizing and orthography heuristics.
pub mod text;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use error::{AuracleError, Result};
pub use model::frequency_model::{FrequencyModel, FrequencyModelBuilder, build_model};
pub use model::mixture_model::MixtureModel;
pub use session::{Session, SessionConfig};
