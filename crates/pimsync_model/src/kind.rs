//! Collection kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a synchronized collection.
///
/// Each kind is backed by a different native local store and a
/// different item text format, but all three share the same
/// reconciliation contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// A contact list (vCard items).
    AddressBook,
    /// A calendar (iCalendar event items).
    Calendar,
    /// A task list (iCalendar todo items).
    TaskList,
}

impl CollectionKind {
    /// Returns the canonical string name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::AddressBook => "address-book",
            CollectionKind::Calendar => "calendar",
            CollectionKind::TaskList => "task-list",
        }
    }

    /// Returns true if collections of this kind carry a color.
    ///
    /// Address books have no color column; `color` info entries are
    /// ignored for them.
    pub fn supports_color(&self) -> bool {
        matches!(self, CollectionKind::Calendar | CollectionKind::TaskList)
    }

    /// Returns all kinds, in a stable order.
    pub fn all() -> [CollectionKind; 3] {
        [
            CollectionKind::AddressBook,
            CollectionKind::Calendar,
            CollectionKind::TaskList,
        ]
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(CollectionKind::AddressBook.as_str(), "address-book");
        assert_eq!(CollectionKind::Calendar.as_str(), "calendar");
        assert_eq!(CollectionKind::TaskList.as_str(), "task-list");
    }

    #[test]
    fn color_support() {
        assert!(!CollectionKind::AddressBook.supports_color());
        assert!(CollectionKind::Calendar.supports_color());
        assert!(CollectionKind::TaskList.supports_color());
    }

    #[test]
    fn all_kinds_have_distinct_names() {
        let kinds = CollectionKind::all();
        for (i, kind) in kinds.iter().enumerate() {
            for other in &kinds[i + 1..] {
                assert_ne!(kind.as_str(), other.as_str());
            }
        }
    }
}
