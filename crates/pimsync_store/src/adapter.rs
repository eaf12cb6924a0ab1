//! Collection adapter trait definition.

use crate::codec::CodecResult;
use crate::error::StoreResult;
use pimsync_model::{
    CollectionId, CollectionInfo, CollectionKind, Cursor, LocalItem, LogEntry, ProgressCounters,
    Value,
};

/// What applying one log entry did to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The store was mutated.
    Applied,
    /// The entry was a no-op; zero store mutations.
    Unchanged,
    /// The entry could not be interpreted; logged, no mutation, and
    /// skipped until a corrected entry supersedes it.
    Rejected,
}

/// Capability set of one collection's local store.
///
/// One implementation exists per collection kind. The engine is
/// generic over this trait only; it never sees a concrete store.
///
/// # Invariants
///
/// - A uid appears in at most one of `query_deleted_items` /
///   `query_dirty_items` per pass
/// - `mark_clean` and `mark_processed` are called only after the
///   corresponding log write is confirmed durable
/// - `decode_and_apply` and `apply_info_entry` are idempotent and
///   never mutate the store for a no-op
/// - Per-item codec failures stay inside the adapter
///   ([`ApplyOutcome::Rejected`]); store errors abort the pass
pub trait CollectionAdapter: Send {
    /// The collection kind this adapter serves.
    fn kind(&self) -> CollectionKind;

    /// The collection's stable identity.
    fn collection_id(&self) -> &CollectionId;

    /// Snapshot of the collection's metadata (name, color, deletion).
    fn info(&self) -> CollectionInfo;

    /// Probes whether the backing list/account exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::PermissionDenied`] if the process
    /// lacks access to the store.
    fn store_available(&self) -> StoreResult<bool>;

    /// Mints uids for rows that never got one, before the push phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn assign_missing_uids(&mut self) -> StoreResult<()>;

    /// Exhaustive flagged-deleted, not-yet-purged items. No ordering
    /// guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn query_deleted_items(&self) -> StoreResult<Vec<LocalItem>>;

    /// Flagged-dirty items, excluding deleted ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn query_dirty_items(&self) -> StoreResult<Vec<LocalItem>>;

    /// Encodes one item as its resource entry (tombstone when
    /// deleted). Deterministic.
    ///
    /// # Errors
    ///
    /// Returns a codec error if serialization fails; the item stays
    /// dirty for retry.
    fn encode(&self, item: &LocalItem) -> CodecResult<LogEntry>;

    /// Applies one resource entry onto the store. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error only for store faults; undecodable entries
    /// are isolated as [`ApplyOutcome::Rejected`].
    fn decode_and_apply(&mut self, entry: &LogEntry) -> StoreResult<ApplyOutcome>;

    /// Applies one collection-metadata entry. Keys `name`, `color`,
    /// `deleted`; unknown keys, `deleted=false`, unchanged names and
    /// unparseable colors are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error only for store faults.
    fn apply_info_entry(&mut self, key: &str, value: &Value) -> StoreResult<ApplyOutcome>;

    /// Info entries for live local metadata that differs from the
    /// tracked shadows (name, color, collection deletion).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn changed_metadata(&self) -> StoreResult<Vec<LogEntry>>;

    /// Updates the shadow behind one pushed metadata entry, once the
    /// push is confirmed durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn commit_metadata(&mut self, entry: &LogEntry) -> StoreResult<()>;

    /// Commits a confirmed item push: purges a deleted row, otherwise
    /// clears its dirty flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn mark_clean(&mut self, item: &LocalItem) -> StoreResult<()>;

    /// Accounts a confirmed item push: −1 for a deletion, +1 iff the
    /// item was never pushed before.
    ///
    /// # Errors
    ///
    /// Returns an error if the counters cannot be updated.
    fn mark_processed(&mut self, item: &LocalItem) -> StoreResult<()>;

    /// Point-in-time progress counters; callable without a pass.
    fn progress(&self) -> ProgressCounters;

    /// Last-applied log position for this collection.
    fn log_cursor(&self) -> Cursor;

    /// Advances the cursor; called only after an entire pulled batch
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be persisted.
    fn set_log_cursor(&mut self, cursor: Cursor) -> StoreResult<()>;

    /// Resets the processed counter and the cursor for an initial
    /// sync replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn reset_progress(&mut self) -> StoreResult<()>;

    /// Store mutation counter: increments on every actual row or
    /// metadata mutation, never on no-ops.
    fn revision(&self) -> u64;
}
