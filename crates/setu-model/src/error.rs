use thiserror::Error;

use crate::CodingSystem;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown coding system: {0}")]
    UnknownSystem(String),
    #[error("invalid concept code: {0:?}")]
    InvalidCode(String),
}

/// Failures reported by a concept repository.
///
/// A missing concept is not an error at this level: lookups return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("concept repository unavailable for {system}: {message}")]
    Unavailable {
        system: CodingSystem,
        message: String,
    },
}

/// A [`ResolveOptions`](crate::ResolveOptions) value out of range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum OptionsError {
    #[error("k must be at least 1")]
    ZeroK,
    #[error("threshold must be within [0, 1], got {0}")]
    Threshold(f32),
    #[error("lexical_bonus must be within [0, 1], got {0}")]
    LexicalBonus(f32),
    #[error("min_similarity must be within [0, 1], got {0}")]
    MinSimilarity(f32),
}
