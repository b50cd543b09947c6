//! Error types shared across crates

use thiserror::Error;

/// Result alias using the core [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
///
/// Crate-specific errors (`LlmError`, `PersistenceError`, `ConfigError`)
/// convert into this so agent code can propagate with `?`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller supplied invalid input. The message is safe to show to clients.
    #[error("{0}")]
    Validation(String),

    /// Requested entity does not exist. The message is safe to show to clients.
    #[error("{0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound(message.into())
    }

    /// True for errors caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }
}
