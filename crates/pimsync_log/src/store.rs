//! Log store trait definition.

use crate::error::LogResult;
use pimsync_model::{CollectionId, Cursor, LogEntry, OriginId, PathPrefix, SequencedEntry};

/// The append-only multi-device log consumed by the engine.
///
/// Implementations are **opaque, durable entry stores**. The log owns
/// ordering and cross-device convergence (last-writer-wins per
/// (path, key)); the engine only pushes entries and reads them back.
///
/// # Invariants
///
/// - `push` returning `Ok` means the entry is durably recorded; the
///   engine commits local bookkeeping (clean flags, purges, counters)
///   only after that
/// - `pull_new_since` returns entries strictly newer than the cursor,
///   in the log's own order; per-path order is total
/// - `pull_all` returns the full surviving history (the latest entry
///   per (path, key)), in the same order
/// - Implementations must be `Send + Sync`; distinct collections may
///   be accessed concurrently
///
/// # Implementors
///
/// - [`super::MemoryLog`] - For tests and ephemeral embedding
pub trait LogStore: Send + Sync {
    /// Appends one entry to a collection's log.
    ///
    /// Returns the position the entry was recorded at.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LogError::Unavailable`] if the log storage
    /// cannot be reached.
    fn push(&self, collection: &CollectionId, entry: LogEntry) -> LogResult<Cursor>;

    /// Returns all entries of one path family strictly newer than
    /// `cursor`, in log order.
    ///
    /// # Errors
    ///
    /// Returns an error if the log storage cannot be read.
    fn pull_new_since(
        &self,
        collection: &CollectionId,
        prefix: PathPrefix,
        cursor: Cursor,
    ) -> LogResult<Vec<SequencedEntry>>;

    /// Returns the full stored history of one path family: the latest
    /// surviving entry per (path, key), in log order.
    ///
    /// Used by initial sync, which replays everything rather than a
    /// delta.
    ///
    /// # Errors
    ///
    /// Returns an error if the log storage cannot be read.
    fn pull_all(
        &self,
        collection: &CollectionId,
        prefix: PathPrefix,
    ) -> LogResult<Vec<SequencedEntry>>;

    /// Returns the origin of the newest entry in a collection's log,
    /// if any.
    ///
    /// Read-only introspection; not part of the reconciliation
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the log storage cannot be read.
    fn latest_known_origin(&self, collection: &CollectionId) -> LogResult<Option<OriginId>>;
}
