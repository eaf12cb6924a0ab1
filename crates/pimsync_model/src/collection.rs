//! Collection identity and metadata.

use crate::kind::CollectionKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, stable collection identifier.
///
/// The identifier is assigned when a collection is created (on user
/// action or on discovery in the log) and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(String);

impl CollectionId {
    /// Creates a collection identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Metadata describing one synchronized collection.
///
/// A collection is "destroyed" only by tombstoning (`deleted = true`);
/// its history is never physically erased from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// The collection kind.
    pub kind: CollectionKind,
    /// Stable identity.
    pub id: CollectionId,
    /// Human-readable name.
    pub name: String,
    /// Display color, for calendars and task lists only.
    pub color: Option<i32>,
    /// Whether the collection has been tombstoned.
    pub deleted: bool,
}

impl CollectionInfo {
    /// Creates metadata for a live, uncolored collection.
    pub fn new(kind: CollectionKind, id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: name.into(),
            color: None,
            deleted: false,
        }
    }

    /// Sets the display color.
    pub fn with_color(mut self, color: i32) -> Self {
        self.color = Some(color);
        self
    }
}
