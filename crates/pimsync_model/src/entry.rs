//! Log entry types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar value carried by a log entry.
///
/// Null at a resource path marks a tombstone.
pub use serde_json::Value;

/// Path segment naming the collection-metadata family.
const INFO_SEGMENT: &str = "info";
/// Path segment prefixing the item family.
const RESOURCES_SEGMENT: &str = "resources";

/// An ordered log entry path.
///
/// Two families exist: `info` (one entry per metadata key) and
/// `resources/<uid>` (one entry per item).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPath {
    segments: Vec<String>,
}

impl EntryPath {
    /// The collection-metadata path.
    pub fn info() -> Self {
        Self {
            segments: vec![INFO_SEGMENT.to_string()],
        }
    }

    /// The path for one item's resource entry.
    pub fn resource(uid: impl Into<String>) -> Self {
        Self {
            segments: vec![RESOURCES_SEGMENT.to_string(), uid.into()],
        }
    }

    /// Returns the path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this is the `info` path.
    pub fn is_info(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == INFO_SEGMENT
    }

    /// Returns the item uid if this is a `resources/<uid>` path.
    pub fn resource_uid(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [family, uid] if family == RESOURCES_SEGMENT => Some(uid),
            _ => None,
        }
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Selects one path family for a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPrefix {
    /// Collection metadata entries.
    Info,
    /// Item resource entries.
    Resources,
}

impl PathPrefix {
    /// Returns true if the given path belongs to this family.
    pub fn matches(&self, path: &EntryPath) -> bool {
        match self {
            PathPrefix::Info => path.is_info(),
            PathPrefix::Resources => path.resource_uid().is_some(),
        }
    }
}

/// One log entry: a scalar value at (path, key).
///
/// The log is last-writer-wins per (path, key); pushing an entry
/// supersedes any earlier entry at the same address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Entry path.
    pub path: EntryPath,
    /// Entry key; empty for resource entries.
    pub key: String,
    /// Entry value; null marks a tombstone at a resource path.
    pub value: Value,
}

impl LogEntry {
    /// Creates a collection-metadata entry.
    pub fn info(key: impl Into<String>, value: Value) -> Self {
        Self {
            path: EntryPath::info(),
            key: key.into(),
            value,
        }
    }

    /// Creates a resource entry carrying serialized item text.
    pub fn resource(uid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: EntryPath::resource(uid),
            key: String::new(),
            value: Value::String(text.into()),
        }
    }

    /// Creates a resource tombstone.
    pub fn tombstone(uid: impl Into<String>) -> Self {
        Self {
            path: EntryPath::resource(uid),
            key: String::new(),
            value: Value::Null,
        }
    }

    /// Returns true if this entry is a resource tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.path.resource_uid().is_some() && self.value.is_null()
    }
}

/// A position in one collection's log.
///
/// Cursors are opaque to everything except the log itself; they only
/// support ordering and equality. `Cursor::ZERO` precedes every entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Cursor(u64);

impl Cursor {
    /// The position before the first entry.
    pub const ZERO: Cursor = Cursor(0);

    /// Creates a cursor from a raw sequence number.
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identifies the device or application that wrote an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginId(String);

impl OriginId {
    /// Creates an origin identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A log entry together with its position and origin, as returned by
/// pulls in the log's own order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEntry {
    /// Position of this entry in the collection's log.
    pub seq: Cursor,
    /// Device or application that wrote the entry.
    pub origin: OriginId,
    /// The entry itself.
    pub entry: LogEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_path() {
        let path = EntryPath::info();
        assert!(path.is_info());
        assert_eq!(path.resource_uid(), None);
        assert_eq!(path.to_string(), "info");
    }

    #[test]
    fn resource_path() {
        let path = EntryPath::resource("abc");
        assert!(!path.is_info());
        assert_eq!(path.resource_uid(), Some("abc"));
        assert_eq!(path.to_string(), "resources/abc");
    }

    #[test]
    fn prefix_matching() {
        assert!(PathPrefix::Info.matches(&EntryPath::info()));
        assert!(!PathPrefix::Info.matches(&EntryPath::resource("x")));
        assert!(PathPrefix::Resources.matches(&EntryPath::resource("x")));
        assert!(!PathPrefix::Resources.matches(&EntryPath::info()));
    }

    #[test]
    fn tombstone_detection() {
        assert!(LogEntry::tombstone("abc").is_tombstone());
        assert!(!LogEntry::resource("abc", "BEGIN:VCARD").is_tombstone());
        assert!(!LogEntry::info("deleted", Value::Null).is_tombstone());
    }

    #[test]
    fn cursor_ordering() {
        assert!(Cursor::ZERO < Cursor::new(1));
        assert!(Cursor::new(1) < Cursor::new(2));
        assert_eq!(Cursor::new(7).value(), 7);
    }
}
