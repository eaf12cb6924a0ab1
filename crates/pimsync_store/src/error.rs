//! Error types for the local store layer.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against a local store.
///
/// Per-item codec failures are not store errors; they are isolated
/// inside the adapter and surface as
/// [`crate::ApplyOutcome::Rejected`] (pull) or a skipped item (push).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required store capability is unavailable to this process.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The backing list or account is missing.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error while persisting the store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Persisted store state could not be read back.
    #[error("invalid persisted store: {0}")]
    Persist(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::PermissionDenied("contacts access revoked".into());
        assert_eq!(err.to_string(), "permission denied: contacts access revoked");

        let err = StoreError::Unavailable("account removed".into());
        assert!(err.to_string().contains("account removed"));
    }
}
