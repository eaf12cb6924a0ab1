//! Shared item row storage.
//!
//! All three collection kinds keep their items in the same row shape:
//! a native payload plus the bookkeeping columns (`uid`, dirty,
//! deleted, pushed). Kind differences live in the adapters and their
//! metadata handling, not here.

use pimsync_model::LocalItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One item row.
///
/// `uid` is `None` until the row is first prepared for pushing; once
/// minted it never changes. `pushed` records whether the item has
/// ever had a confirmed push, which is what makes a later push "new"
/// for counting purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ItemRow {
    pub uid: Option<String>,
    pub payload: String,
    pub dirty: bool,
    pub deleted: bool,
    pub pushed: bool,
}

impl ItemRow {
    /// Snapshot for the engine; `None` while the row has no uid yet.
    fn snapshot(&self) -> Option<LocalItem> {
        Some(LocalItem {
            uid: self.uid.clone()?,
            dirty: self.dirty,
            deleted: self.deleted,
            is_new: !self.pushed,
            payload: self.payload.clone(),
        })
    }
}

/// Result of a remote upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Upsert {
    Created,
    Updated,
    Unchanged,
}

/// Item rows of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ItemTable {
    rows: Vec<ItemRow>,
}

impl ItemTable {
    /// Creates a new local row without a uid; dirty, never pushed.
    pub fn create(&mut self, payload: impl Into<String>) {
        self.rows.push(ItemRow {
            uid: None,
            payload: payload.into(),
            dirty: true,
            deleted: false,
            pushed: false,
        });
    }

    /// Creates a new local row with an app-supplied uid.
    pub fn create_with_uid(&mut self, uid: impl Into<String>, payload: impl Into<String>) {
        self.rows.push(ItemRow {
            uid: Some(uid.into()),
            payload: payload.into(),
            dirty: true,
            deleted: false,
            pushed: false,
        });
    }

    /// Replaces a row's payload and flags it dirty. Returns false if
    /// no live row has this uid.
    pub fn edit(&mut self, uid: &str, payload: impl Into<String>) -> bool {
        match self.live_row_mut(uid) {
            Some(row) => {
                row.payload = payload.into();
                row.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Flags a row deleted, awaiting its tombstone push. Returns
    /// false if no live row has this uid.
    pub fn delete(&mut self, uid: &str) -> bool {
        match self.live_row_mut(uid) {
            Some(row) => {
                row.deleted = true;
                true
            }
            None => false,
        }
    }

    /// Mints a v4 uuid for every row that has none. Returns how many
    /// uids were assigned.
    pub fn assign_missing_uids(&mut self) -> usize {
        let mut assigned = 0;
        for row in &mut self.rows {
            if row.uid.is_none() {
                row.uid = Some(Uuid::new_v4().to_string());
                assigned += 1;
            }
        }
        assigned
    }

    /// Flagged-deleted rows not yet purged. No ordering guaranteed.
    pub fn deleted_items(&self) -> Vec<LocalItem> {
        self.rows
            .iter()
            .filter(|row| row.deleted)
            .filter_map(ItemRow::snapshot)
            .collect()
    }

    /// Flagged-dirty rows, excluding deleted ones.
    pub fn dirty_items(&self) -> Vec<LocalItem> {
        self.rows
            .iter()
            .filter(|row| row.dirty && !row.deleted)
            .filter_map(ItemRow::snapshot)
            .collect()
    }

    /// Commits a confirmed push: purges a deleted row, otherwise
    /// clears the dirty flag and records the item as pushed.
    pub fn mark_clean(&mut self, item: &LocalItem) {
        if item.deleted {
            self.rows
                .retain(|row| row.uid.as_deref() != Some(item.uid.as_str()));
        } else if let Some(row) = self.row_mut(&item.uid) {
            row.dirty = false;
            row.pushed = true;
        }
    }

    /// Applies a remote upsert by uid, preserving the row's local
    /// bookkeeping. The remote state is authoritative: the row ends
    /// clean because it now matches the log.
    pub fn apply_remote_upsert(&mut self, uid: &str, payload: &str) -> Upsert {
        match self.row_mut(uid) {
            Some(row) => {
                if row.payload == payload && !row.dirty && !row.deleted && row.pushed {
                    Upsert::Unchanged
                } else {
                    row.payload = payload.to_string();
                    row.dirty = false;
                    row.deleted = false;
                    row.pushed = true;
                    Upsert::Updated
                }
            }
            None => {
                self.rows.push(ItemRow {
                    uid: Some(uid.to_string()),
                    payload: payload.to_string(),
                    dirty: false,
                    deleted: false,
                    pushed: true,
                });
                Upsert::Created
            }
        }
    }

    /// Applies a remote tombstone. Returns true if a row was removed.
    pub fn apply_remote_delete(&mut self, uid: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.uid.as_deref() != Some(uid));
        self.rows.len() != before
    }

    /// Returns a live row's payload.
    pub fn payload(&self, uid: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.uid.as_deref() == Some(uid) && !row.deleted)
            .map(|row| row.payload.as_str())
    }

    /// Returns true if a live row has this uid.
    pub fn contains(&self, uid: &str) -> bool {
        self.payload(uid).is_some()
    }

    /// Number of rows, including deleted-but-unpurged ones.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, uid: &str) -> Option<&mut ItemRow> {
        self.rows
            .iter_mut()
            .find(|row| row.uid.as_deref() == Some(uid))
    }

    fn live_row_mut(&mut self, uid: &str) -> Option<&mut ItemRow> {
        self.rows
            .iter_mut()
            .find(|row| row.uid.as_deref() == Some(uid) && !row.deleted)
    }
}
