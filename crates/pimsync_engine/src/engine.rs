//! The reconciliation engine.

use crate::error::{SyncError, SyncResult};
use crate::registry::{CollectionRegistry, SyncStateStore};
use pimsync_log::LogStore;
use pimsync_model::{CollectionId, CollectionInfo, LocalItem, PathPrefix, ProgressCounters};
use pimsync_store::{ApplyOutcome, CollectionAdapter, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a completed pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Entries pushed to the log (metadata and items).
    pub pushed: usize,
    /// Entries pulled and applied or found to be no-ops.
    pub pulled: usize,
    /// Pulled entries rejected as uninterpretable.
    pub rejected: usize,
}

/// Why a collection's pass was skipped rather than attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The process lacks access to the local store.
    PermissionDenied,
    /// The backing list or account is currently missing.
    StoreUnavailable,
}

/// Outcome of one collection's pass.
///
/// Skips are expected, transient conditions; failures carry the error
/// that aborted the pass. An aborted pass leaves the collection in a
/// consistent state: the cursor never advanced past an unapplied
/// entry and unpushed items are still flagged dirty.
#[derive(Debug)]
pub enum PassOutcome {
    /// The pass ran to completion.
    Success(PassSummary),
    /// The pass was not attempted.
    Skipped(SkipReason),
    /// The pass aborted.
    Failed(SyncError),
}

/// Drives reconciliation passes over all registered collections.
///
/// Each pass locks its collection's adapter for the whole pass, so a
/// second trigger for the same collection queues behind the first.
/// Cancellation is checked between phases and between items; a
/// cancelled pass aborts cleanly and the next run picks up where the
/// durable state left off.
pub struct SyncEngine<L: LogStore> {
    pub(crate) log: Arc<L>,
    pub(crate) registry: Arc<dyn CollectionRegistry>,
    pub(crate) sync_state: Arc<dyn SyncStateStore>,
    pub(crate) cancelled: AtomicBool,
}

impl<L: LogStore> SyncEngine<L> {
    /// Creates an engine over a log, a registry, and the device's
    /// sync state.
    pub fn new(
        log: Arc<L>,
        registry: Arc<dyn CollectionRegistry>,
        sync_state: Arc<dyn SyncStateStore>,
    ) -> Self {
        Self {
            log,
            registry,
            sync_state,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Requests cancellation; the running pass aborts at its next
    /// phase boundary. Sticky until [`Self::clear_cancelled`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation request.
    pub fn clear_cancelled(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Returns true if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Runs one reconciliation round over every registered collection.
    ///
    /// Collections that have not completed their initial sync on this
    /// device replay the full history first; regular passes only run
    /// once every pending replay has completed.
    ///
    /// # Errors
    ///
    /// Returns an error if initial sync aborts; per-collection pass
    /// failures are reported in the outcomes instead.
    pub fn run_reconciliation(&self) -> SyncResult<Vec<(CollectionId, PassOutcome)>> {
        self.run_initial_sync()?;

        let mut outcomes = Vec::new();
        for id in self.registry.collections() {
            let outcome = self.sync_collection(&id);
            outcomes.push((id, outcome));
        }
        Ok(outcomes)
    }

    /// Point-in-time progress counters of one collection; callable at
    /// any time, no pass required.
    pub fn progress(&self, id: &CollectionId) -> Option<ProgressCounters> {
        self.registry
            .adapter(id)
            .map(|adapter| adapter.lock().progress())
    }

    /// Metadata snapshots of every registered collection.
    pub fn list_collections(&self) -> Vec<CollectionInfo> {
        self.registry
            .collections()
            .iter()
            .filter_map(|id| self.registry.adapter(id))
            .map(|adapter| adapter.lock().info())
            .collect()
    }

    /// Runs one pass for a single collection, replaying its history
    /// first when its initial sync has not completed on this device.
    pub fn sync_collection(&self, id: &CollectionId) -> PassOutcome {
        match self.try_sync_collection(id) {
            Ok(summary) => {
                info!(collection = %id, pushed = summary.pushed, pulled = summary.pulled,
                      rejected = summary.rejected, "pass complete");
                PassOutcome::Success(summary)
            }
            Err(SyncError::Store(StoreError::PermissionDenied(message))) => {
                debug!(collection = %id, message, "pass skipped, permission denied");
                PassOutcome::Skipped(SkipReason::PermissionDenied)
            }
            Err(SyncError::Store(StoreError::Unavailable(message))) => {
                debug!(collection = %id, message, "pass skipped, store unavailable");
                PassOutcome::Skipped(SkipReason::StoreUnavailable)
            }
            Err(err) => {
                warn!(collection = %id, error = %err, "pass failed");
                PassOutcome::Failed(err)
            }
        }
    }

    fn try_sync_collection(&self, id: &CollectionId) -> SyncResult<PassSummary> {
        self.ensure_initial_sync(id)?;

        let adapter = self
            .registry
            .adapter(id)
            .ok_or_else(|| SyncError::UnknownCollection(id.clone()))?;
        let mut adapter = adapter.lock();

        self.check_cancelled()?;
        if !adapter.store_available()? {
            return Err(StoreError::Unavailable(format!("store missing for {id}")).into());
        }

        let mut summary = PassSummary::default();

        // Metadata deltas go first so a brand-new collection announces
        // itself before its items.
        for entry in adapter.changed_metadata()? {
            self.check_cancelled()?;
            self.log.push(id, entry.clone())?;
            adapter.commit_metadata(&entry)?;
            summary.pushed += 1;
        }

        self.check_cancelled()?;
        adapter.assign_missing_uids()?;

        // Tombstones before item updates.
        for item in adapter.query_deleted_items()? {
            self.push_item(id, &mut *adapter, &item, &mut summary)?;
        }
        self.check_cancelled()?;
        for item in adapter.query_dirty_items()? {
            self.push_item(id, &mut *adapter, &item, &mut summary)?;
        }

        self.check_cancelled()?;
        self.pull_phase(id, &mut *adapter, &mut summary)?;

        Ok(summary)
    }

    fn push_item(
        &self,
        id: &CollectionId,
        adapter: &mut dyn CollectionAdapter,
        item: &LocalItem,
        summary: &mut PassSummary,
    ) -> SyncResult<()> {
        self.check_cancelled()?;
        let entry = match adapter.encode(item) {
            Ok(entry) => entry,
            Err(err) => {
                // The item stays dirty; a later pass retries it.
                warn!(collection = %id, uid = item.uid, error = %err, "item not encodable, leaving dirty");
                return Ok(());
            }
        };

        self.log.push(id, entry)?;
        adapter.mark_clean(item)?;
        adapter.mark_processed(item)?;
        summary.pushed += 1;
        Ok(())
    }

    /// Pulls everything newer than the cursor, applies it, and commits
    /// the cursor once per pass, after the whole batch landed.
    fn pull_phase(
        &self,
        id: &CollectionId,
        adapter: &mut dyn CollectionAdapter,
        summary: &mut PassSummary,
    ) -> SyncResult<()> {
        let cursor = adapter.log_cursor();
        let mut batch = self.log.pull_new_since(id, PathPrefix::Info, cursor)?;
        batch.extend(self.log.pull_new_since(id, PathPrefix::Resources, cursor)?);
        batch.sort_by_key(|sequenced| sequenced.seq);

        let mut high = cursor;
        for sequenced in &batch {
            let outcome = if sequenced.entry.path.is_info() {
                adapter.apply_info_entry(&sequenced.entry.key, &sequenced.entry.value)?
            } else {
                adapter.decode_and_apply(&sequenced.entry)?
            };
            match outcome {
                ApplyOutcome::Rejected => summary.rejected += 1,
                ApplyOutcome::Applied | ApplyOutcome::Unchanged => summary.pulled += 1,
            }
            high = high.max(sequenced.seq);
        }

        if high > cursor {
            adapter.set_log_cursor(high)?;
        }
        Ok(())
    }

    pub(crate) fn check_cancelled(&self) -> SyncResult<()> {
        if self.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}
