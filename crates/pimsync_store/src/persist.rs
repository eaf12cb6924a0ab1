//! JSON-file persistence for collection stores.
//!
//! Stores serialize to pretty-printed JSON. Saves go through a
//! sibling temp file and an atomic rename so a crash mid-write never
//! leaves a torn store on disk.

use crate::error::StoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loads a store from its JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse as
/// the expected store shape.
pub fn load_store<S: DeserializeOwned>(path: &Path) -> StoreResult<S> {
    let text = fs::read_to_string(path)?;
    let store = serde_json::from_str(&text)?;
    debug!(path = %path.display(), "loaded store");
    Ok(store)
}

/// Saves a store to its JSON file via temp file and rename.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem step fails.
pub fn save_store<S: Serialize>(path: &Path, store: &S) -> StoreResult<()> {
    let text = serde_json::to_string_pretty(store)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "saved store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_book::AddressBook;
    use crate::calendar::Calendar;
    use pimsync_model::{CollectionId, Cursor};

    #[test]
    fn address_book_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");

        let mut book = AddressBook::new(CollectionId::new("contacts-1"), "Personal");
        book.create_contact_with_uid("abc", "FN:Ada");
        book.rename("Family");
        save_store(&path, &book).unwrap();

        let restored: AddressBook = load_store(&path).unwrap();
        assert_eq!(restored.name(), "Family");
        assert_eq!(restored.contact("abc"), Some("FN:Ada"));
        assert_eq!(restored.revision(), book.revision());
    }

    #[test]
    fn calendar_keeps_cursor_and_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar.json");

        let mut calendar = Calendar::new(CollectionId::new("cal-1"), "Work");
        calendar.set_color(0xFF0000);
        calendar.cursor = Cursor::new(17);
        calendar.progress.increment();
        calendar.progress.set_shadow_color(Some(0xFF0000));
        save_store(&path, &calendar).unwrap();

        let restored: Calendar = load_store(&path).unwrap();
        assert_eq!(restored.cursor, Cursor::new(17));
        assert_eq!(restored.progress().num_processed_entries, 1);
        assert_eq!(restored.progress().shadow_color, Some(0xFF0000));
        assert_eq!(restored.color(), Some(0xFF0000));
    }

    #[test]
    fn runtime_flags_reset_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");

        let mut book = AddressBook::new(CollectionId::new("contacts-1"), "Personal");
        book.set_available(false);
        book.set_permission_granted(false);
        save_store(&path, &book).unwrap();

        // Availability and permission are runtime state, not persisted.
        let restored: AddressBook = load_store(&path).unwrap();
        assert!(restored.available);
        assert!(restored.permission_granted);
    }

    #[test]
    fn save_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");

        let mut book = AddressBook::new(CollectionId::new("contacts-1"), "Personal");
        save_store(&path, &book).unwrap();
        book.create_contact_with_uid("abc", "FN:Ada");
        save_store(&path, &book).unwrap();

        let restored: AddressBook = load_store(&path).unwrap();
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result: StoreResult<AddressBook> = load_store(&dir.path().join("absent.json"));
        assert!(result.is_err());
    }
}
