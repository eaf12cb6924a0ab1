//! Item text codec contract.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised by item codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An item could not be serialized; it stays dirty for retry.
    #[error("serialize failed for uid {uid}: {message}")]
    Serialize {
        /// The item's uid.
        uid: String,
        /// Error message.
        message: String,
    },

    /// Item text could not be parsed.
    #[error("parse failed: {message}")]
    Parse {
        /// Error message.
        message: String,
    },

    /// Parsing yielded something other than exactly one record.
    #[error("expected exactly one record, found {found}")]
    RecordCount {
        /// Number of records found.
        found: usize,
    },
}

impl CodecError {
    /// Creates a serialize error.
    pub fn serialize(uid: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialize {
            uid: uid.into(),
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

/// One parsed item record: its uid plus the record text in the
/// store's native form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedItem {
    /// Stable item uid.
    pub uid: String,
    /// Record text.
    pub payload: String,
}

impl DecodedItem {
    /// Creates a decoded item.
    pub fn new(uid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            payload: payload.into(),
        }
    }
}

/// Converts between native item records and serialized item text.
///
/// This is an external collaborator: real implementations wrap a
/// vCard or iCalendar library. The contract is deliberately narrow:
/// adapters only need a deterministic text form per record and the
/// records back out of a text.
pub trait ItemCodec: Send + Sync {
    /// Serializes one record to item text.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Serialize`] if the record cannot be
    /// rendered; the item stays dirty for retry.
    fn serialize(&self, item: &DecodedItem) -> CodecResult<String>;

    /// Parses item text into its records.
    ///
    /// Callers treat anything other than exactly one record as a
    /// caller error; the codec itself reports what it found.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Parse`] if the text is not valid for
    /// this codec.
    fn parse(&self, text: &str) -> CodecResult<Vec<DecodedItem>>;
}

/// A reference codec with a flat `BEGIN:ITEM`/`END:ITEM` framing.
///
/// Stands in for real vCard/iCalendar codecs in tests and examples:
///
/// ```text
/// BEGIN:ITEM
/// UID:<uid>
/// <payload lines>
/// END:ITEM
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatCodec;

impl FlatCodec {
    /// Creates the codec.
    pub fn new() -> Self {
        Self
    }
}

impl ItemCodec for FlatCodec {
    fn serialize(&self, item: &DecodedItem) -> CodecResult<String> {
        if item.uid.is_empty() {
            return Err(CodecError::serialize("", "record has no uid"));
        }
        if item.uid.contains('\n') {
            return Err(CodecError::serialize(&item.uid, "uid contains a newline"));
        }

        let mut text = String::new();
        text.push_str("BEGIN:ITEM\n");
        text.push_str("UID:");
        text.push_str(&item.uid);
        text.push('\n');
        if !item.payload.is_empty() {
            text.push_str(&item.payload);
            text.push('\n');
        }
        text.push_str("END:ITEM\n");
        Ok(text)
    }

    fn parse(&self, text: &str) -> CodecResult<Vec<DecodedItem>> {
        let mut records = Vec::new();
        let mut current: Option<(Option<String>, Vec<&str>)> = None;

        for line in text.lines() {
            match line {
                "BEGIN:ITEM" => {
                    if current.is_some() {
                        return Err(CodecError::parse("nested BEGIN:ITEM"));
                    }
                    current = Some((None, Vec::new()));
                }
                "END:ITEM" => {
                    let (uid, body) = current
                        .take()
                        .ok_or_else(|| CodecError::parse("END:ITEM without BEGIN:ITEM"))?;
                    let uid = uid.ok_or_else(|| CodecError::parse("record has no UID line"))?;
                    records.push(DecodedItem::new(uid, body.join("\n")));
                }
                _ => {
                    if let Some((uid, body)) = current.as_mut() {
                        if let Some(value) = line.strip_prefix("UID:") {
                            *uid = Some(value.to_string());
                        } else {
                            body.push(line);
                        }
                    }
                    // Text outside a record is ignored.
                }
            }
        }

        if current.is_some() {
            return Err(CodecError::parse("unterminated record"));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_then_parse_roundtrip() {
        let codec = FlatCodec::new();
        let item = DecodedItem::new("abc", "FN:Ada Lovelace\nTEL:+44 20 7946 0000");

        let text = codec.serialize(&item).unwrap();
        let records = codec.parse(&text).unwrap();

        assert_eq!(records, vec![item]);
    }

    #[test]
    fn serialize_requires_uid() {
        let codec = FlatCodec::new();
        let result = codec.serialize(&DecodedItem::new("", "FN:Nobody"));
        assert!(matches!(result, Err(CodecError::Serialize { .. })));
    }

    #[test]
    fn parse_empty_payload() {
        let codec = FlatCodec::new();
        let text = codec.serialize(&DecodedItem::new("abc", "")).unwrap();
        let records = codec.parse(&text).unwrap();
        assert_eq!(records[0].payload, "");
    }

    #[test]
    fn parse_multiple_records() {
        let codec = FlatCodec::new();
        let mut text = codec
            .serialize(&DecodedItem::new("a", "FN:One"))
            .unwrap();
        text.push_str(&codec.serialize(&DecodedItem::new("b", "FN:Two")).unwrap());

        let records = codec.parse(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uid, "a");
        assert_eq!(records[1].uid, "b");
    }

    #[test]
    fn parse_no_records() {
        let codec = FlatCodec::new();
        let records = codec.parse("just some text").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn parse_rejects_missing_uid() {
        let codec = FlatCodec::new();
        let result = codec.parse("BEGIN:ITEM\nFN:No Uid\nEND:ITEM\n");
        assert!(matches!(result, Err(CodecError::Parse { .. })));
    }

    #[test]
    fn parse_rejects_unterminated_record() {
        let codec = FlatCodec::new();
        let result = codec.parse("BEGIN:ITEM\nUID:abc\n");
        assert!(matches!(result, Err(CodecError::Parse { .. })));
    }
}
