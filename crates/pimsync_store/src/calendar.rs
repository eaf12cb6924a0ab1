//! Calendar store and adapter.

use crate::adapter::{ApplyOutcome, CollectionAdapter};
use crate::codec::{CodecResult, ItemCodec};
use crate::entry_codec::{EntryCodec, ResourceChange};
use crate::error::{StoreError, StoreResult};
use crate::metadata::ColoredMeta;
use crate::table::{ItemTable, Upsert};
use parking_lot::Mutex;
use pimsync_model::{
    CollectionId, CollectionInfo, CollectionKind, Cursor, LocalItem, LogEntry, ProgressCounters,
    ProgressTracker, Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

fn default_true() -> bool {
    true
}

/// The local event store of one calendar.
///
/// Rows carry iCalendar text payloads. Calendars additionally carry a
/// display color; the last color pushed to or applied from the log is
/// shadowed in the progress tracker so an unchanged color is never
/// re-pushed.
#[derive(Debug, Serialize, Deserialize)]
pub struct Calendar {
    pub(crate) id: CollectionId,
    pub(crate) name: String,
    pub(crate) color: Option<i32>,
    pub(crate) deleted: bool,
    pub(crate) shadow_name: Option<String>,
    pub(crate) tombstone_pushed: bool,
    pub(crate) table: ItemTable,
    pub(crate) cursor: Cursor,
    pub(crate) progress: ProgressTracker,
    pub(crate) revision: u64,
    #[serde(skip_serializing, default = "default_true")]
    pub(crate) available: bool,
    #[serde(skip_serializing, default = "default_true")]
    pub(crate) permission_granted: bool,
}

impl Calendar {
    /// Creates an empty calendar without a color.
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: None,
            deleted: false,
            shadow_name: None,
            tombstone_pushed: false,
            table: ItemTable::default(),
            cursor: Cursor::ZERO,
            progress: ProgressTracker::new(),
            revision: 0,
            available: true,
            permission_granted: true,
        }
    }

    /// Adds an event without a uid yet; dirty, never pushed.
    pub fn create_event(&mut self, ical: impl Into<String>) {
        self.table.create(ical);
        self.revision += 1;
    }

    /// Adds an event under an app-supplied uid; dirty, never pushed.
    pub fn create_event_with_uid(&mut self, uid: impl Into<String>, ical: impl Into<String>) {
        self.table.create_with_uid(uid, ical);
        self.revision += 1;
    }

    /// Replaces an event's iCalendar text and flags it dirty.
    pub fn edit_event(&mut self, uid: &str, ical: impl Into<String>) -> bool {
        let edited = self.table.edit(uid, ical);
        if edited {
            self.revision += 1;
        }
        edited
    }

    /// Flags an event deleted, awaiting its tombstone push.
    pub fn delete_event(&mut self, uid: &str) -> bool {
        let deleted = self.table.delete(uid);
        if deleted {
            self.revision += 1;
        }
        deleted
    }

    /// Returns a live event's iCalendar text.
    pub fn event(&self, uid: &str) -> Option<&str> {
        self.table.payload(uid)
    }

    /// Returns true if a live event has this uid.
    pub fn contains(&self, uid: &str) -> bool {
        self.table.contains(uid)
    }

    /// Number of rows, including deleted-but-unpurged ones.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The collection's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the calendar locally; pushed on the next pass.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.revision += 1;
    }

    /// The calendar's display color.
    pub fn color(&self) -> Option<i32> {
        self.color
    }

    /// Sets the display color locally; pushed on the next pass.
    pub fn set_color(&mut self, color: i32) {
        self.color = Some(color);
        self.revision += 1;
    }

    /// Tombstones the calendar locally; pushed on the next pass.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.revision += 1;
    }

    /// Returns true if the calendar has been tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Simulates the backing account appearing or vanishing.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Simulates calendar access being granted or revoked.
    pub fn set_permission_granted(&mut self, granted: bool) {
        self.permission_granted = granted;
    }

    /// Store mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Point-in-time progress counters.
    pub fn progress(&self) -> ProgressCounters {
        self.progress.snapshot()
    }

    pub(crate) fn meta(&mut self) -> ColoredMeta<'_> {
        ColoredMeta {
            id: &self.id,
            name: &mut self.name,
            shadow_name: &mut self.shadow_name,
            color: &mut self.color,
            deleted: &mut self.deleted,
            tombstone_pushed: &mut self.tombstone_pushed,
            progress: &self.progress,
            revision: &mut self.revision,
        }
    }
}

/// The calendar's [`CollectionAdapter`] implementation.
pub struct CalendarAdapter {
    id: CollectionId,
    store: Arc<Mutex<Calendar>>,
    codec: EntryCodec,
}

impl CalendarAdapter {
    /// Creates an adapter over a shared store handle and an external
    /// iCalendar codec.
    pub fn new(store: Arc<Mutex<Calendar>>, codec: Arc<dyn ItemCodec>) -> Self {
        let id = store.lock().id.clone();
        Self {
            id,
            store,
            codec: EntryCodec::new(codec),
        }
    }
}

impl CollectionAdapter for CalendarAdapter {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Calendar
    }

    fn collection_id(&self) -> &CollectionId {
        &self.id
    }

    fn info(&self) -> CollectionInfo {
        let store = self.store.lock();
        CollectionInfo {
            kind: CollectionKind::Calendar,
            id: store.id.clone(),
            name: store.name.clone(),
            color: store.color,
            deleted: store.deleted,
        }
    }

    fn store_available(&self) -> StoreResult<bool> {
        let store = self.store.lock();
        if !store.permission_granted {
            return Err(StoreError::PermissionDenied(format!(
                "no calendar access for {}",
                self.id
            )));
        }
        Ok(store.available)
    }

    fn assign_missing_uids(&mut self) -> StoreResult<()> {
        let mut store = self.store.lock();
        let assigned = store.table.assign_missing_uids();
        if assigned > 0 {
            store.revision += 1;
            debug!(collection = %self.id, assigned, "assigned uids to new events");
        }
        Ok(())
    }

    fn query_deleted_items(&self) -> StoreResult<Vec<LocalItem>> {
        Ok(self.store.lock().table.deleted_items())
    }

    fn query_dirty_items(&self) -> StoreResult<Vec<LocalItem>> {
        Ok(self.store.lock().table.dirty_items())
    }

    fn encode(&self, item: &LocalItem) -> CodecResult<LogEntry> {
        self.codec.encode_resource(item)
    }

    fn decode_and_apply(&mut self, entry: &LogEntry) -> StoreResult<ApplyOutcome> {
        let change = match self.codec.decode_resource(entry) {
            Ok(change) => change,
            Err(err) => {
                warn!(collection = %self.id, path = %entry.path, error = %err, "rejecting resource entry");
                return Ok(ApplyOutcome::Rejected);
            }
        };

        let mut store = self.store.lock();
        Ok(match change {
            ResourceChange::Tombstone(uid) => {
                if store.table.apply_remote_delete(&uid) {
                    store.revision += 1;
                    ApplyOutcome::Applied
                } else {
                    debug!(collection = %self.id, uid, "tombstone for unknown event");
                    ApplyOutcome::Unchanged
                }
            }
            ResourceChange::Upsert(record) => {
                match store.table.apply_remote_upsert(&record.uid, &record.payload) {
                    Upsert::Created | Upsert::Updated => {
                        store.revision += 1;
                        ApplyOutcome::Applied
                    }
                    Upsert::Unchanged => ApplyOutcome::Unchanged,
                }
            }
        })
    }

    fn apply_info_entry(&mut self, key: &str, value: &Value) -> StoreResult<ApplyOutcome> {
        Ok(self.store.lock().meta().apply_info_entry(key, value))
    }

    fn changed_metadata(&self) -> StoreResult<Vec<LogEntry>> {
        Ok(self.store.lock().meta().changed_entries())
    }

    fn commit_metadata(&mut self, entry: &LogEntry) -> StoreResult<()> {
        self.store.lock().meta().commit_entry(entry);
        Ok(())
    }

    fn mark_clean(&mut self, item: &LocalItem) -> StoreResult<()> {
        let mut store = self.store.lock();
        store.table.mark_clean(item);
        store.revision += 1;
        Ok(())
    }

    fn mark_processed(&mut self, item: &LocalItem) -> StoreResult<()> {
        let store = self.store.lock();
        if item.deleted {
            store.progress.decrement();
        } else if item.is_new {
            store.progress.increment();
        }
        Ok(())
    }

    fn progress(&self) -> ProgressCounters {
        self.store.lock().progress.snapshot()
    }

    fn log_cursor(&self) -> Cursor {
        self.store.lock().cursor
    }

    fn set_log_cursor(&mut self, cursor: Cursor) -> StoreResult<()> {
        self.store.lock().cursor = cursor;
        Ok(())
    }

    fn reset_progress(&mut self) -> StoreResult<()> {
        let mut store = self.store.lock();
        store.progress.reset();
        store.cursor = Cursor::ZERO;
        Ok(())
    }

    fn revision(&self) -> u64 {
        self.store.lock().revision
    }
}
