//! Collection registry and device sync state.

use parking_lot::Mutex;
use pimsync_model::CollectionId;
use pimsync_store::CollectionAdapter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared, exclusively-lockable adapter handle.
///
/// The engine locks an adapter for the whole duration of its pass, so
/// overlapping triggers for the same collection queue instead of
/// interleaving. Distinct collections sync independently.
pub type SharedAdapter = Arc<Mutex<dyn CollectionAdapter>>;

/// Resolves collection ids to their adapters.
pub trait CollectionRegistry: Send + Sync {
    /// All registered collection ids, in registration order.
    fn collections(&self) -> Vec<CollectionId>;

    /// The adapter for one collection, if registered.
    fn adapter(&self, id: &CollectionId) -> Option<SharedAdapter>;
}

/// A fixed registry populated up front.
#[derive(Default)]
pub struct StaticRegistry {
    adapters: Vec<(CollectionId, SharedAdapter)>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its own collection id.
    pub fn register(&mut self, adapter: SharedAdapter) {
        let id = adapter.lock().collection_id().clone();
        self.adapters.push((id, adapter));
    }
}

impl CollectionRegistry for StaticRegistry {
    fn collections(&self) -> Vec<CollectionId> {
        self.adapters.iter().map(|(id, _)| id.clone()).collect()
    }

    fn adapter(&self, id: &CollectionId) -> Option<SharedAdapter> {
        self.adapters
            .iter()
            .find(|(known, _)| known == id)
            .map(|(_, adapter)| Arc::clone(adapter))
    }
}

/// Persists which collections have completed their initial sync on
/// this device.
///
/// A collection's flag must only be set after its full history replay
/// completed; a device that crashed mid-replay starts that
/// collection's replay over.
pub trait SyncStateStore: Send + Sync {
    /// Returns true if the collection's initial sync has completed on
    /// this device.
    fn initial_sync_done(&self, id: &CollectionId) -> bool;

    /// Records the collection's initial-sync flag.
    fn set_initial_sync_done(&self, id: &CollectionId, done: bool);
}

/// In-memory sync state, for tests and ephemeral embedding.
#[derive(Debug, Default)]
pub struct MemorySyncState {
    done: Mutex<std::collections::HashSet<CollectionId>>,
    all: AtomicBool,
}

impl MemorySyncState {
    /// Creates state with every flag unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state reporting every collection as synced, skipping
    /// initial sync entirely.
    pub fn already_synced() -> Self {
        Self {
            done: Mutex::new(std::collections::HashSet::new()),
            all: AtomicBool::new(true),
        }
    }
}

impl SyncStateStore for MemorySyncState {
    fn initial_sync_done(&self, id: &CollectionId) -> bool {
        self.all.load(Ordering::SeqCst) || self.done.lock().contains(id)
    }

    fn set_initial_sync_done(&self, id: &CollectionId, done: bool) {
        if done {
            self.done.lock().insert(id.clone());
        } else {
            self.done.lock().remove(id);
        }
    }
}
