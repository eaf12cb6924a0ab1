//! Flag-gated initial sync.
//!
//! A fresh device (or one whose local stores were wiped) must not
//! treat the whole log as a delta: its cursors say nothing and its
//! counters would double-count. Instead the full surviving history is
//! replayed into the stores, items first and collection metadata
//! second, without pushing anything. Each collection's initial-sync
//! flag is set only once its own replay finished, so an interrupted
//! replay starts that collection over on the next run.

use crate::error::{SyncError, SyncResult};
use pimsync_log::LogStore;
use pimsync_model::{CollectionId, Cursor, PathPrefix};
use pimsync_store::StoreError;
use tracing::{debug, info};

use crate::engine::SyncEngine;

impl<L: LogStore> SyncEngine<L> {
    /// Replays the full log history into every registered collection
    /// whose initial sync has not completed yet, marking each one
    /// synced as its replay finishes.
    ///
    /// Never pushes. Local rows that were dirty before the replay stay
    /// dirty (unless the replay overwrote them) and get pushed by the
    /// first regular pass.
    ///
    /// # Errors
    ///
    /// Returns an error if a replay aborts; that collection's flag
    /// stays unset and its replay starts over next run.
    pub fn run_initial_sync(&self) -> SyncResult<()> {
        for id in self.registry.collections() {
            self.ensure_initial_sync(&id)?;
        }
        Ok(())
    }

    /// Replays one collection's history and sets its flag, if not done
    /// yet. Every pass entry point goes through this gate; a regular
    /// pass must never run before the collection's replay, or the
    /// replay's progress reset would wipe counters the pass earned.
    pub(crate) fn ensure_initial_sync(&self, id: &CollectionId) -> SyncResult<()> {
        if self.sync_state.initial_sync_done(id) {
            return Ok(());
        }
        self.check_cancelled()?;
        self.replay_collection(id)?;
        self.sync_state.set_initial_sync_done(id, true);
        info!(collection = %id, "initial sync complete");
        Ok(())
    }

    fn replay_collection(&self, id: &CollectionId) -> SyncResult<()> {
        let adapter = self
            .registry
            .adapter(id)
            .ok_or_else(|| SyncError::UnknownCollection(id.clone()))?;
        let mut adapter = adapter.lock();

        if !adapter.store_available()? {
            return Err(StoreError::Unavailable(format!("store missing for {id}")).into());
        }

        // A half-done earlier replay may have left counters or a
        // cursor behind; the replay owns both from scratch.
        adapter.reset_progress()?;

        let mut high = Cursor::ZERO;
        let mut applied = 0usize;

        for sequenced in self.log.pull_all(id, PathPrefix::Resources)? {
            self.check_cancelled()?;
            adapter.decode_and_apply(&sequenced.entry)?;
            high = high.max(sequenced.seq);
            applied += 1;
        }
        for sequenced in self.log.pull_all(id, PathPrefix::Info)? {
            self.check_cancelled()?;
            adapter.apply_info_entry(&sequenced.entry.key, &sequenced.entry.value)?;
            high = high.max(sequenced.seq);
            applied += 1;
        }

        adapter.set_log_cursor(high)?;
        debug!(collection = %id, applied, cursor = high.value(), "history replayed");
        Ok(())
    }
}
