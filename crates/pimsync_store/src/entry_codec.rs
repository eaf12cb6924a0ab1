//! Entry codec glue between local items and log entries.

use crate::codec::{CodecError, CodecResult, DecodedItem, ItemCodec};
use pimsync_model::{LocalItem, LogEntry, Value};
use std::sync::Arc;
use tracing::debug;

/// The effect a resource entry has on a local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Delete the row with this uid, if present.
    Tombstone(String),
    /// Create or update the row with this uid.
    Upsert(DecodedItem),
}

/// Converts between [`LocalItem`] snapshots and resource log entries,
/// delegating item text to an external [`ItemCodec`].
///
/// Owned by each adapter; encoding is deterministic so that repeated
/// pushes of the same state produce identical entries.
#[derive(Clone)]
pub struct EntryCodec {
    codec: Arc<dyn ItemCodec>,
}

impl EntryCodec {
    /// Creates the glue around an item codec.
    pub fn new(codec: Arc<dyn ItemCodec>) -> Self {
        Self { codec }
    }

    /// Encodes one item as a resource entry.
    ///
    /// A deleted item encodes as a tombstone; anything else carries
    /// the serialized record.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if serialization fails; the item
    /// stays dirty for retry.
    pub fn encode_resource(&self, item: &LocalItem) -> CodecResult<LogEntry> {
        if item.deleted {
            return Ok(LogEntry::tombstone(&item.uid));
        }
        let text = self
            .codec
            .serialize(&DecodedItem::new(&item.uid, &item.payload))?;
        Ok(LogEntry::resource(&item.uid, text))
    }

    /// Decodes one resource entry into the change it describes.
    ///
    /// The path's uid segment is authoritative; a uid inside the
    /// record that disagrees is logged and overridden.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the entry is not at a resource
    /// path, carries a non-text value, or its text does not parse to
    /// exactly one record.
    pub fn decode_resource(&self, entry: &LogEntry) -> CodecResult<ResourceChange> {
        let uid = entry
            .path
            .resource_uid()
            .ok_or_else(|| CodecError::parse(format!("not a resource path: {}", entry.path)))?;

        let text = match &entry.value {
            Value::Null => return Ok(ResourceChange::Tombstone(uid.to_string())),
            Value::String(text) => text,
            other => {
                return Err(CodecError::parse(format!(
                    "resource value must be text or null, got {other}"
                )))
            }
        };

        let mut records = self.codec.parse(text)?;
        if records.len() != 1 {
            return Err(CodecError::RecordCount {
                found: records.len(),
            });
        }
        let mut record = records.remove(0);
        if record.uid != uid {
            debug!(path_uid = uid, record_uid = %record.uid, "record uid disagrees with path, using path uid");
            record.uid = uid.to_string();
        }
        Ok(ResourceChange::Upsert(record))
    }
}

/// Parses a log color value into the local integer form.
///
/// Accepts a `"#RRGGBB"` string or a plain integer; anything else is
/// unparseable and gets ignored by adapters.
pub fn parse_color(value: &Value) -> Option<i32> {
    match value {
        Value::String(text) => {
            let hex = text.strip_prefix('#')?;
            if hex.len() != 6 {
                return None;
            }
            i32::from_str_radix(hex, 16).ok()
        }
        Value::Number(number) => number.as_i64().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
}

/// Formats a local color as the log's `"#RRGGBB"` value.
pub fn format_color(color: i32) -> Value {
    Value::String(format!("#{:06X}", color & 0x00FF_FFFF))
}
