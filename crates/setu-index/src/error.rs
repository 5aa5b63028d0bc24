use setu_model::{CodingSystem, RepositoryError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// No snapshot has been published for the system, or it was evicted.
    #[error("embedding index unavailable for {0}")]
    Unavailable(CodingSystem),
    #[error("concept {code} belongs to {actual}, not {expected}")]
    SystemMismatch {
        expected: CodingSystem,
        actual: CodingSystem,
        code: String,
    },
    #[error("vector dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
