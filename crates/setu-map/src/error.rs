use setu_index::IndexError;
use setu_model::{CodingSystem, OptionsError, RepositoryError};
use thiserror::Error;

/// Failures of a single resolution.
///
/// "No good match" is never an error: it is a `NOT_FOUND` or `PARTIAL`
/// status on a successful result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// The source code does not exist in the source system. Not retryable.
    #[error("concept {code} not found in {system}")]
    NotFound { system: CodingSystem, code: String },

    /// The repository or the target index could not serve the request.
    #[error("{system} unavailable: {message}")]
    Unavailable {
        system: CodingSystem,
        message: String,
    },

    /// A coding-system identifier did not parse.
    #[error("invalid coding system: {0:?}")]
    InvalidSystem(String),

    #[error("invalid resolve options: {0}")]
    InvalidOptions(#[from] OptionsError),
}

impl ResolveError {
    /// Stable identifier of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unavailable { .. } => "UNAVAILABLE",
            Self::InvalidSystem(_) => "INVALID_SYSTEM",
            Self::InvalidOptions(_) => "INVALID_OPTIONS",
        }
    }

    /// Only unavailability is worth retrying, with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub(crate) fn from_index(system: CodingSystem, err: IndexError) -> Self {
        match err {
            IndexError::Repository(repository) => repository.into(),
            other => Self::Unavailable {
                system,
                message: other.to_string(),
            },
        }
    }
}

impl From<RepositoryError> for ResolveError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Unavailable { system, message } => Self::Unavailable {
                system,
                message: format!("concept repository: {message}"),
            },
        }
    }
}
