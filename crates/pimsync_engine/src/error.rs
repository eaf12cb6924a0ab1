//! Error types for reconciliation.

use pimsync_log::LogError;
use pimsync_model::CollectionId;
use pimsync_store::{CodecError, StoreError};
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can abort a sync pass.
///
/// Per-item codec failures never surface here; adapters isolate them
/// (an undecodable pulled entry is rejected, an unserializable local
/// item stays dirty). What does surface is anything that makes the
/// pass as a whole unsound to continue.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local store failed or denied access.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The log failed.
    #[error(transparent)]
    Log(#[from] LogError),

    /// A codec failure escaped adapter isolation.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// No adapter is registered for this collection.
    #[error("unknown collection: {0}")]
    UnknownCollection(CollectionId),

    /// The run was cancelled between phases.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Returns true if a later run may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Store(StoreError::PermissionDenied(_)) => true,
            SyncError::Store(StoreError::Unavailable(_)) => true,
            SyncError::Store(_) => false,
            SyncError::Log(err) => err.is_retryable(),
            SyncError::Codec(_) => false,
            SyncError::UnknownCollection(_) => false,
            SyncError::Cancelled => true,
        }
    }
}
