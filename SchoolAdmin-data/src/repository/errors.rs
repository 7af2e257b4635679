use std::sync::PoisonError;
use thiserror::Error;

use crate::config::ConfigError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response other than validation or not-found
    #[error("Server responded with {status}: {message}")]
    Status {
        status: u16,
        message: String,
    },

    /// Validation error reported by the backend (HTTP 422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected envelope
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Backend switched off (used by the in-memory store)
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(error: serde_json::Error) -> Self {
        RepositoryError::Decode(error.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RepositoryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RepositoryError::Decode(error.to_string())
        } else {
            RepositoryError::Transport(error.to_string())
        }
    }
}
