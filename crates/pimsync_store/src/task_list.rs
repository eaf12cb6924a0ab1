//! Task list store and adapter.

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

/// The local task store of one task list.
///
/// Rows carry iCalendar VTODO text payloads. Like calendars, task
/// lists carry a display color with its shadow in the progress
/// tracker.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskList {
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

impl TaskList {
    /// Creates an empty task list without a color.
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

    /// Adds a task without a uid yet; dirty, never pushed.
    pub fn create_task(&mut self, vtodo: impl Into<String>) {
        self.table.create(vtodo);
        self.revision += 1;
    }

    /// Adds a task under an app-supplied uid; dirty, never pushed.
    pub fn create_task_with_uid(&mut self, uid: impl Into<String>, vtodo: impl Into<String>) {
        self.table.create_with_uid(uid, vtodo);
        self.revision += 1;
    }

    /// Replaces a task's text and flags it dirty.
    pub fn edit_task(&mut self, uid: &str, vtodo: impl Into<String>) -> bool {
        let edited = self.table.edit(uid, vtodo);
        if edited {
            self.revision += 1;
        }
        edited
    }

    /// Flags a task deleted, awaiting its tombstone push.
    pub fn delete_task(&mut self, uid: &str) -> bool {
        let deleted = self.table.delete(uid);
        if deleted {
            self.revision += 1;
        }
        deleted
    }

    /// Returns a live task's text.
    pub fn task(&self, uid: &str) -> Option<&str> {
        self.table.payload(uid)
    }

    /// Returns true if a live task has this uid.
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

    /// Renames the task list locally; pushed on the next pass.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.revision += 1;
    }

    /// The task list's display color.
    pub fn color(&self) -> Option<i32> {
        self.color
    }

    /// Sets the display color locally; pushed on the next pass.
    pub fn set_color(&mut self, color: i32) {
        self.color = Some(color);
        self.revision += 1;
    }

    /// Tombstones the task list locally; pushed on the next pass.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.revision += 1;
    }

    /// Returns true if the task list has been tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Simulates the backing account appearing or vanishing.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Simulates task access being granted or revoked.
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

/// The task list's [`CollectionAdapter`] implementation.
pub struct TaskListAdapter {
    id: CollectionId,
    store: Arc<Mutex<TaskList>>,
    codec: EntryCodec,
}

impl TaskListAdapter {
    /// Creates an adapter over a shared store handle and an external
    /// VTODO codec.
    pub fn new(store: Arc<Mutex<TaskList>>, codec: Arc<dyn ItemCodec>) -> Self {
        let id = store.lock().id.clone();
        Self {
            id,
            store,
            codec: EntryCodec::new(codec),
        }
    }
}

impl CollectionAdapter for TaskListAdapter {
    fn kind(&self) -> CollectionKind {
        CollectionKind::TaskList
    }

    fn collection_id(&self) -> &CollectionId {
        &self.id
    }

    fn info(&self) -> CollectionInfo {
        let store = self.store.lock();
        CollectionInfo {
            kind: CollectionKind::TaskList,
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
                "no task access for {}",
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
            debug!(collection = %self.id, assigned, "assigned uids to new tasks");
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
                    debug!(collection = %self.id, uid, "tombstone for unknown task");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FlatCodec;

    fn setup() -> (Arc<Mutex<TaskList>>, TaskListAdapter) {
        let store = Arc::new(Mutex::new(TaskList::new(
            CollectionId::new("tasks-1"),
            "Inbox",
        )));
        let adapter = TaskListAdapter::new(Arc::clone(&store), Arc::new(FlatCodec::new()));
        (store, adapter)
    }

    #[test]
    fn tasks_roundtrip_through_entries() {
        let (store, mut adapter) = setup();
        let item = LocalItem::new("t-1", "SUMMARY:Water plants\nSTATUS:NEEDS-ACTION").dirty();

        let entry = adapter.encode(&item).unwrap();
        assert_eq!(adapter.decode_and_apply(&entry).unwrap(), ApplyOutcome::Applied);

        assert_eq!(
            store.lock().task("t-1"),
            Some("SUMMARY:Water plants\nSTATUS:NEEDS-ACTION")
        );
    }

    #[test]
    fn task_lists_track_color_like_calendars() {
        let (store, mut adapter) = setup();
        for entry in adapter.changed_metadata().unwrap() {
            adapter.commit_metadata(&entry).unwrap();
        }

        store.lock().set_color(0x336699);
        let entries = adapter.changed_metadata().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "color");

        adapter.commit_metadata(&entries[0]).unwrap();
        assert!(adapter.changed_metadata().unwrap().is_empty());
    }

    #[test]
    fn remote_collection_tombstone_applies_once() {
        let (store, mut adapter) = setup();

        assert_eq!(
            adapter.apply_info_entry("deleted", &Value::Bool(true)).unwrap(),
            ApplyOutcome::Applied
        );
        assert!(store.lock().is_deleted());
        // A remotely applied tombstone must not be pushed back.
        assert_eq!(
            adapter
                .changed_metadata()
                .unwrap()
                .iter()
                .filter(|entry| entry.key == "deleted")
                .count(),
            0
        );

        assert_eq!(
            adapter.apply_info_entry("deleted", &Value::Bool(true)).unwrap(),
            ApplyOutcome::Unchanged
        );
    }

    #[test]
    fn deletion_push_decrements_progress() {
        let (store, mut adapter) = setup();
        store.lock().create_task_with_uid("t-1", "SUMMARY:One");

        let item = adapter.query_dirty_items().unwrap().remove(0);
        adapter.mark_clean(&item).unwrap();
        adapter.mark_processed(&item).unwrap();
        assert_eq!(adapter.progress().num_processed_entries, 1);

        store.lock().delete_task("t-1");
        let item = adapter.query_deleted_items().unwrap().remove(0);
        adapter.mark_clean(&item).unwrap();
        adapter.mark_processed(&item).unwrap();
        assert_eq!(adapter.progress().num_processed_entries, 0);
        assert!(store.lock().is_empty());
    }
}
