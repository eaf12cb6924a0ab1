//! Address book store and adapter.

use crate::adapter::{ApplyOutcome, CollectionAdapter};
use crate::codec::{CodecResult, ItemCodec};
use crate::entry_codec::{EntryCodec, ResourceChange};
use crate::error::{StoreError, StoreResult};
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

/// The local contact store of one address book.
///
/// Rows carry vCard text payloads. Address books have no color
/// column; `color` info entries are ignored. Persisted alongside the
/// rows are the collection's private columns: the progress counters,
/// the pull cursor, and the metadata shadows.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressBook {
    pub(crate) id: CollectionId,
    pub(crate) name: String,
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

impl AddressBook {
    /// Creates an empty address book.
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
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

    /// Adds a contact without a uid yet; dirty, never pushed.
    pub fn create_contact(&mut self, vcard: impl Into<String>) {
        self.table.create(vcard);
        self.revision += 1;
    }

    /// Adds a contact under an app-supplied uid; dirty, never pushed.
    pub fn create_contact_with_uid(&mut self, uid: impl Into<String>, vcard: impl Into<String>) {
        self.table.create_with_uid(uid, vcard);
        self.revision += 1;
    }

    /// Replaces a contact's vCard and flags it dirty.
    pub fn edit_contact(&mut self, uid: &str, vcard: impl Into<String>) -> bool {
        let edited = self.table.edit(uid, vcard);
        if edited {
            self.revision += 1;
        }
        edited
    }

    /// Flags a contact deleted, awaiting its tombstone push.
    pub fn delete_contact(&mut self, uid: &str) -> bool {
        let deleted = self.table.delete(uid);
        if deleted {
            self.revision += 1;
        }
        deleted
    }

    /// Returns a live contact's vCard.
    pub fn contact(&self, uid: &str) -> Option<&str> {
        self.table.payload(uid)
    }

    /// Returns true if a live contact has this uid.
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

    /// Renames the collection locally; pushed on the next pass.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.revision += 1;
    }

    /// Tombstones the collection locally; pushed on the next pass.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.revision += 1;
    }

    /// Returns true if the collection has been tombstoned.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Simulates the backing account appearing or vanishing.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Simulates contact access being granted or revoked.
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
}

/// The address book's [`CollectionAdapter`] implementation.
pub struct AddressBookAdapter {
    id: CollectionId,
    store: Arc<Mutex<AddressBook>>,
    codec: EntryCodec,
}

impl AddressBookAdapter {
    /// Creates an adapter over a shared store handle and an external
    /// vCard codec.
    pub fn new(store: Arc<Mutex<AddressBook>>, codec: Arc<dyn ItemCodec>) -> Self {
        let id = store.lock().id.clone();
        Self {
            id,
            store,
            codec: EntryCodec::new(codec),
        }
    }
}

impl CollectionAdapter for AddressBookAdapter {
    fn kind(&self) -> CollectionKind {
        CollectionKind::AddressBook
    }

    fn collection_id(&self) -> &CollectionId {
        &self.id
    }

    fn info(&self) -> CollectionInfo {
        let store = self.store.lock();
        CollectionInfo {
            kind: CollectionKind::AddressBook,
            id: store.id.clone(),
            name: store.name.clone(),
            color: None,
            deleted: store.deleted,
        }
    }

    fn store_available(&self) -> StoreResult<bool> {
        let store = self.store.lock();
        if !store.permission_granted {
            return Err(StoreError::PermissionDenied(format!(
                "no contact access for {}",
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
            debug!(collection = %self.id, assigned, "assigned uids to new contacts");
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
                    debug!(collection = %self.id, uid, "tombstone for unknown contact");
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
        let mut store = self.store.lock();
        Ok(match key {
            "name" => match value.as_str() {
                Some(name) => {
                    let changed = name != store.name;
                    if changed {
                        store.name = name.to_string();
                        store.revision += 1;
                    }
                    // Settle the shadow either way so an equal name is
                    // never re-pushed.
                    store.shadow_name = Some(name.to_string());
                    if changed {
                        ApplyOutcome::Applied
                    } else {
                        ApplyOutcome::Unchanged
                    }
                }
                None => {
                    warn!(collection = %self.id, ?value, "ignoring non-text name");
                    ApplyOutcome::Unchanged
                }
            },
            "color" => {
                // Address books carry no color column.
                debug!(collection = %self.id, "ignoring color for address book");
                ApplyOutcome::Unchanged
            }
            "deleted" => match value.as_bool() {
                Some(true) => {
                    let changed = !store.deleted;
                    store.deleted = true;
                    store.tombstone_pushed = true;
                    if changed {
                        store.revision += 1;
                        ApplyOutcome::Applied
                    } else {
                        ApplyOutcome::Unchanged
                    }
                }
                _ => ApplyOutcome::Unchanged,
            },
            other => {
                debug!(collection = %self.id, key = other, "ignoring unknown info key");
                ApplyOutcome::Unchanged
            }
        })
    }

    fn changed_metadata(&self) -> StoreResult<Vec<LogEntry>> {
        let store = self.store.lock();
        let mut entries = Vec::new();
        if store.shadow_name.as_deref() != Some(store.name.as_str()) {
            entries.push(LogEntry::info("name", Value::String(store.name.clone())));
        }
        if store.deleted && !store.tombstone_pushed {
            entries.push(LogEntry::info("deleted", Value::Bool(true)));
        }
        Ok(entries)
    }

    fn commit_metadata(&mut self, entry: &LogEntry) -> StoreResult<()> {
        let mut store = self.store.lock();
        match entry.key.as_str() {
            "name" => store.shadow_name = entry.value.as_str().map(str::to_string),
            "deleted" => store.tombstone_pushed = true,
            _ => {}
        }
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
