//! Error types for the log contract.

use thiserror::Error;

/// Result type for log operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors that can occur against the log.
#[derive(Debug, Error)]
pub enum LogError {
    /// Log storage is inaccessible.
    #[error("log unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
        /// Whether a later attempt may succeed.
        retryable: bool,
    },

    /// An entry could not be interpreted against the log's layout.
    #[error("malformed log entry: {0}")]
    MalformedEntry(String),
}

impl LogError {
    /// Creates a retryable unavailability error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a permanent unavailability error.
    pub fn unavailable_fatal(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            LogError::Unavailable { retryable, .. } => *retryable,
            LogError::MalformedEntry(_) => false,
        }
    }
}
