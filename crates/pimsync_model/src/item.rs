//! Local item records.

use serde::{Deserialize, Serialize};

/// A snapshot of one item row in a local store.
///
/// The uid is generated once, persisted with the row, and maps 1:1 to
/// the log path `resources/<uid>`. The flags mirror the native
/// store's bookkeeping columns:
///
/// - `dirty`: locally modified, not yet pushed
/// - `deleted`: locally removed, awaiting a tombstone push before the
///   row is purged
/// - `is_new`: never pushed before; used only to decide whether a
///   push counts towards `num_processed_entries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalItem {
    /// Stable item uid, unique within the collection.
    pub uid: String,
    /// Locally modified since the last push.
    pub dirty: bool,
    /// Locally removed, awaiting tombstone push.
    pub deleted: bool,
    /// True on the first-ever push of this item.
    pub is_new: bool,
    /// Opaque serialized record in the store's native form.
    pub payload: String,
}

impl LocalItem {
    /// Creates a clean, already-synced item snapshot.
    pub fn new(uid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            dirty: false,
            deleted: false,
            is_new: false,
            payload: payload.into(),
        }
    }

    /// Marks the snapshot dirty.
    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// Marks the snapshot deleted.
    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Marks the snapshot as never pushed.
    pub fn new_item(mut self) -> Self {
        self.is_new = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_flags() {
        let item = LocalItem::new("abc", "P1").dirty().new_item();
        assert!(item.dirty);
        assert!(item.is_new);
        assert!(!item.deleted);
        assert_eq!(item.uid, "abc");
        assert_eq!(item.payload, "P1");
    }
}
