//! Character-level word models.
//!
//! This module provides:
//! - Context strategies deriving a key from a word in progress (`Strategy`)
//! - Learnable associators with exact learn/unlearn (`Associator`)
//! - A weighted mixture of associators (`MixtureModel`)
//! - A hill-climbing trainer for mixtures (`Trainer`)
//! - Immutable corpus frequency tables (`FrequencyModel`)
//! - Word generation and log-likelihood scoring over both model kinds

/// Set of characters a model may predict.
pub mod alphabet;

/// Learnable context -> next-symbol weight table.
///
/// Learning and unlearning the same word are exact inverses.
pub mod associator;

/// Context key strategies (raw n-gram, consonant/vowel, segment).
pub mod context;

/// Fixed-order frequency table built once from a corpus.
///
/// Handles corpus ingestion, Laplace-smoothed probabilities, the JSON wire
/// format and the binary snapshot cache.
pub mod frequency_model;

/// Generation parameters (attempts, threshold, ordering, truncation).
pub mod generate_options;

/// Word sampling and expectedness ranking.
pub mod generator;

/// Ordered, weighted composition of associators.
///
/// Always includes a non-learning baseline so sampling never sees a zero
/// total weight.
pub mod mixture_model;

/// Log-likelihood scoring and nearest-model identification.
pub mod scorer;

/// Weighted next-symbol distribution for a single context.
pub mod state;

/// Greedy trial-and-revert training against an objective text.
pub mod trainer;
