//! In-memory log for testing.

use crate::error::{LogError, LogResult};
use crate::store::LogStore;
use parking_lot::RwLock;
use pimsync_model::{CollectionId, Cursor, LogEntry, OriginId, PathPrefix, SequencedEntry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// One collection's entry stream.
#[derive(Debug, Default)]
struct CollectionLog {
    next_seq: u64,
    entries: Vec<SequencedEntry>,
}

impl CollectionLog {
    fn append(&mut self, origin: OriginId, entry: LogEntry) -> Cursor {
        self.next_seq += 1;
        let seq = Cursor::new(self.next_seq);
        self.entries.push(SequencedEntry { seq, origin, entry });
        seq
    }
}

/// An in-memory log store.
///
/// Suitable for unit tests, integration tests, and ephemeral
/// embedding. Entries are kept in append order per collection;
/// `pull_all` resolves last-writer-wins per (path, key) the way the
/// real log's merge does.
///
/// # Thread Safety
///
/// The log is thread-safe and can be shared across threads; distinct
/// collections do not contend beyond the map lock.
#[derive(Debug)]
pub struct MemoryLog {
    collections: RwLock<HashMap<CollectionId, CollectionLog>>,
    origin: OriginId,
    unavailable: AtomicBool,
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLog {
    /// Creates an empty log writing under the origin `"local"`.
    pub fn new() -> Self {
        Self::with_origin("local")
    }

    /// Creates an empty log writing under the given origin.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            origin: OriginId::new(origin),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent operation fail with
    /// [`LogError::Unavailable`] until switched back.
    ///
    /// For testing the engine's failure paths.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Appends an entry under a foreign origin, as another device
    /// would.
    pub fn push_from(
        &self,
        origin: &OriginId,
        collection: &CollectionId,
        entry: LogEntry,
    ) -> LogResult<Cursor> {
        self.check_available()?;
        let mut collections = self.collections.write();
        let log = collections.entry(collection.clone()).or_default();
        Ok(log.append(origin.clone(), entry))
    }

    /// Returns the raw entry stream of a collection, in append order.
    ///
    /// Useful for asserting exactly what a pass pushed.
    pub fn entries(&self, collection: &CollectionId) -> Vec<SequencedEntry> {
        self.collections
            .read()
            .get(collection)
            .map(|log| log.entries.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> LogResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LogError::unavailable("memory log switched unavailable"))
        } else {
            Ok(())
        }
    }

    fn filtered<F>(&self, collection: &CollectionId, mut keep: F) -> Vec<SequencedEntry>
    where
        F: FnMut(&SequencedEntry) -> bool,
    {
        self.collections
            .read()
            .get(collection)
            .map(|log| log.entries.iter().filter(|e| keep(e)).cloned().collect())
            .unwrap_or_default()
    }
}

impl LogStore for MemoryLog {
    fn push(&self, collection: &CollectionId, entry: LogEntry) -> LogResult<Cursor> {
        let origin = self.origin.clone();
        self.push_from(&origin, collection, entry)
    }

    fn pull_new_since(
        &self,
        collection: &CollectionId,
        prefix: PathPrefix,
        cursor: Cursor,
    ) -> LogResult<Vec<SequencedEntry>> {
        self.check_available()?;
        Ok(self.filtered(collection, |e| e.seq > cursor && prefix.matches(&e.entry.path)))
    }

    fn pull_all(
        &self,
        collection: &CollectionId,
        prefix: PathPrefix,
    ) -> LogResult<Vec<SequencedEntry>> {
        self.check_available()?;

        // Last writer wins per (path, key), then back to log order.
        let mut latest: HashMap<(Vec<String>, String), SequencedEntry> = HashMap::new();
        for entry in self.filtered(collection, |e| prefix.matches(&e.entry.path)) {
            let address = (
                entry.entry.path.segments().to_vec(),
                entry.entry.key.clone(),
            );
            latest.insert(address, entry);
        }

        let mut survivors: Vec<SequencedEntry> = latest.into_values().collect();
        survivors.sort_by_key(|e| e.seq);
        Ok(survivors)
    }

    fn latest_known_origin(&self, collection: &CollectionId) -> LogResult<Option<OriginId>> {
        self.check_available()?;
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|log| log.entries.last())
            .map(|e| e.origin.clone()))
    }
}
