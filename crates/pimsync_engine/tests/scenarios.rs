//! End-to-end reconciliation scenarios over a shared log.

use parking_lot::Mutex;
use pimsync_engine::{
    MemorySyncState, PassOutcome, SharedAdapter, SkipReason, StaticRegistry, SyncEngine,
};
use pimsync_log::MemoryLog;
use pimsync_model::{
    CollectionId, CollectionInfo, CollectionKind, Cursor, LocalItem, LogEntry, OriginId,
    ProgressCounters, Value,
};
use pimsync_store::{
    AddressBook, AddressBookAdapter, ApplyOutcome, Calendar, CalendarAdapter, CodecResult,
    CollectionAdapter, FlatCodec, StoreError, StoreResult, TaskList, TaskListAdapter,
};
use std::sync::Arc;

fn record(uid: &str, body: &str) -> String {
    format!("BEGIN:ITEM\nUID:{uid}\n{body}\nEND:ITEM\n")
}

struct ContactDevice {
    engine: SyncEngine<MemoryLog>,
    store: Arc<Mutex<AddressBook>>,
}

impl ContactDevice {
    fn new(log: Arc<MemoryLog>, id: &CollectionId) -> Self {
        let store = Arc::new(Mutex::new(AddressBook::new(id.clone(), "Personal")));
        let adapter: SharedAdapter = Arc::new(Mutex::new(AddressBookAdapter::new(
            Arc::clone(&store),
            Arc::new(FlatCodec::new()),
        )));
        let mut registry = StaticRegistry::new();
        registry.register(adapter);

        Self {
            engine: SyncEngine::new(log, Arc::new(registry), Arc::new(MemorySyncState::new())),
            store,
        }
    }

    fn run(&self) -> PassOutcome {
        let mut outcomes = self.engine.run_reconciliation().unwrap();
        assert_eq!(outcomes.len(), 1);
        outcomes.remove(0).1
    }

    fn progress(&self) -> ProgressCounters {
        self.store.lock().progress()
    }
}

#[test]
fn two_devices_converge_over_an_item_lifecycle() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("contacts-1");
    let device_a = ContactDevice::new(Arc::clone(&log), &id);
    let device_b = ContactDevice::new(Arc::clone(&log), &id);

    // Creation on A reaches B.
    device_a.store.lock().create_contact_with_uid("ada", "FN:Ada");
    device_a.run();
    device_b.run();
    assert_eq!(device_b.store.lock().contact("ada"), Some("FN:Ada"));

    // Edit on B reaches A.
    device_b.store.lock().edit_contact("ada", "FN:Ada Lovelace");
    device_b.run();
    device_a.run();
    assert_eq!(device_a.store.lock().contact("ada"), Some("FN:Ada Lovelace"));

    // Deletion on A purges on both sides.
    device_a.store.lock().delete_contact("ada");
    device_a.run();
    device_b.run();
    assert!(device_a.store.lock().is_empty());
    assert!(device_b.store.lock().is_empty());

    // Only the device that pushed creations and deletions counted.
    assert_eq!(device_a.progress().num_processed_entries, 0);
    assert_eq!(device_b.progress().num_processed_entries, 0);

    // Converged devices exchange nothing further.
    let entries = log.entries(&id).len();
    device_a.run();
    device_b.run();
    assert_eq!(log.entries(&id).len(), entries);
}

#[test]
fn late_joining_device_replays_history_first() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("contacts-1");
    let device_a = ContactDevice::new(Arc::clone(&log), &id);

    device_a.store.lock().create_contact_with_uid("ada", "FN:Ada");
    device_a.store.lock().create_contact_with_uid("bob", "FN:Bob");
    device_a.run();
    device_a.store.lock().delete_contact("bob");
    device_a.run();

    // B joins after all of that history.
    let device_b = ContactDevice::new(Arc::clone(&log), &id);
    let before = log.entries(&id).len();
    assert!(matches!(device_b.run(), PassOutcome::Success(_)));

    let store = device_b.store.lock();
    assert_eq!(store.contact("ada"), Some("FN:Ada"));
    assert!(!store.contains("bob"));
    drop(store);

    // Joining replays, it does not push.
    assert_eq!(log.entries(&id).len(), before);
    assert_eq!(device_b.progress().num_processed_entries, 0);
}

#[test]
fn task_list_metadata_converges_without_echo() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("tasks-1");

    let build = |log: Arc<MemoryLog>| {
        let store = Arc::new(Mutex::new(TaskList::new(id.clone(), "Inbox")));
        let adapter: SharedAdapter = Arc::new(Mutex::new(TaskListAdapter::new(
            Arc::clone(&store),
            Arc::new(FlatCodec::new()),
        )));
        let mut registry = StaticRegistry::new();
        registry.register(adapter);
        let engine = SyncEngine::new(log, Arc::new(registry), Arc::new(MemorySyncState::new()));
        (engine, store)
    };

    let (engine_a, store_a) = build(Arc::clone(&log));
    let (engine_b, store_b) = build(Arc::clone(&log));

    store_a.lock().set_color(0x336699);
    engine_a.run_reconciliation().unwrap();
    engine_b.run_reconciliation().unwrap();
    assert_eq!(store_b.lock().color(), Some(0x336699));

    store_b.lock().rename("Errands");
    engine_b.run_reconciliation().unwrap();
    engine_a.run_reconciliation().unwrap();
    assert_eq!(store_a.lock().name(), "Errands");

    // Nothing left to say: further rounds push no entries.
    let entries = log.entries(&id).len();
    engine_a.run_reconciliation().unwrap();
    engine_b.run_reconciliation().unwrap();
    assert_eq!(log.entries(&id).len(), entries);
}

#[test]
fn collection_deletion_propagates() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("contacts-1");
    let device_a = ContactDevice::new(Arc::clone(&log), &id);
    let device_b = ContactDevice::new(Arc::clone(&log), &id);
    device_a.run();
    device_b.run();

    device_a.store.lock().mark_deleted();
    device_a.run();
    device_b.run();

    assert!(device_b.store.lock().is_deleted());

    // Neither side announces the deletion again.
    let entries = log.entries(&id).len();
    device_a.run();
    device_b.run();
    assert_eq!(log.entries(&id).len(), entries);
}

#[test]
fn mixed_fleet_skips_only_the_blocked_collection() {
    let log = Arc::new(MemoryLog::new());

    let contacts = Arc::new(Mutex::new(AddressBook::new(
        CollectionId::new("contacts-1"),
        "Personal",
    )));
    let calendar = Arc::new(Mutex::new(Calendar::new(
        CollectionId::new("cal-1"),
        "Work",
    )));
    calendar.lock().set_permission_granted(false);
    contacts.lock().create_contact_with_uid("ada", "FN:Ada");

    let mut registry = StaticRegistry::new();
    registry.register(Arc::new(Mutex::new(AddressBookAdapter::new(
        Arc::clone(&contacts),
        Arc::new(FlatCodec::new()),
    ))));
    registry.register(Arc::new(Mutex::new(CalendarAdapter::new(
        Arc::clone(&calendar),
        Arc::new(FlatCodec::new()),
    ))));

    let engine = SyncEngine::new(
        log,
        Arc::new(registry),
        Arc::new(MemorySyncState::already_synced()),
    );
    let outcomes = engine.run_reconciliation().unwrap();

    assert!(matches!(outcomes[0].1, PassOutcome::Success(_)));
    assert!(matches!(
        outcomes[1].1,
        PassOutcome::Skipped(SkipReason::PermissionDenied)
    ));

    // The granted collection still synced fully.
    let progress = engine.progress(&CollectionId::new("contacts-1")).unwrap();
    assert_eq!(progress.num_processed_entries, 1);
    assert!(engine.progress(&CollectionId::new("nope")).is_none());

    let infos = engine.list_collections();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].kind, CollectionKind::AddressBook);
    assert_eq!(infos[1].kind, CollectionKind::Calendar);
    assert_eq!(infos[1].name, "Work");
}

#[test]
fn overlapping_triggers_for_one_collection_queue() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("contacts-1");

    let store = Arc::new(Mutex::new(AddressBook::new(id.clone(), "Personal")));
    for n in 0..20 {
        store
            .lock()
            .create_contact_with_uid(format!("c{n}"), format!("FN:Contact {n}"));
    }

    let adapter: SharedAdapter = Arc::new(Mutex::new(AddressBookAdapter::new(
        Arc::clone(&store),
        Arc::new(FlatCodec::new()),
    )));
    let mut registry = StaticRegistry::new();
    registry.register(adapter);

    let engine = Arc::new(SyncEngine::new(
        log,
        Arc::new(registry),
        Arc::new(MemorySyncState::already_synced()),
    ));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            std::thread::spawn(move || engine.sync_collection(&id))
        })
        .collect();
    for handle in handles {
        assert!(matches!(handle.join().unwrap(), PassOutcome::Success(_)));
    }

    // The second pass queued behind the first and found nothing dirty:
    // every item was pushed exactly once.
    let progress = engine.progress(&id).unwrap();
    assert_eq!(progress.num_processed_entries, 20);
    for n in 0..20 {
        assert!(store.lock().contains(&format!("c{n}")));
    }
}

/// Delegating adapter that fails exactly one `decode_and_apply`, as a
/// store backend dying mid-pull would.
struct FlakyAdapter {
    inner: AddressBookAdapter,
    faults_left: usize,
}

impl CollectionAdapter for FlakyAdapter {
    fn kind(&self) -> CollectionKind {
        self.inner.kind()
    }
    fn collection_id(&self) -> &CollectionId {
        self.inner.collection_id()
    }
    fn info(&self) -> CollectionInfo {
        self.inner.info()
    }
    fn store_available(&self) -> StoreResult<bool> {
        self.inner.store_available()
    }
    fn assign_missing_uids(&mut self) -> StoreResult<()> {
        self.inner.assign_missing_uids()
    }
    fn query_deleted_items(&self) -> StoreResult<Vec<LocalItem>> {
        self.inner.query_deleted_items()
    }
    fn query_dirty_items(&self) -> StoreResult<Vec<LocalItem>> {
        self.inner.query_dirty_items()
    }
    fn encode(&self, item: &LocalItem) -> CodecResult<LogEntry> {
        self.inner.encode(item)
    }
    fn decode_and_apply(&mut self, entry: &LogEntry) -> StoreResult<ApplyOutcome> {
        if self.faults_left > 0 {
            self.faults_left -= 1;
            return Err(StoreError::Unavailable("store died mid-pull".into()));
        }
        self.inner.decode_and_apply(entry)
    }
    fn apply_info_entry(&mut self, key: &str, value: &Value) -> StoreResult<ApplyOutcome> {
        self.inner.apply_info_entry(key, value)
    }
    fn changed_metadata(&self) -> StoreResult<Vec<LogEntry>> {
        self.inner.changed_metadata()
    }
    fn commit_metadata(&mut self, entry: &LogEntry) -> StoreResult<()> {
        self.inner.commit_metadata(entry)
    }
    fn mark_clean(&mut self, item: &LocalItem) -> StoreResult<()> {
        self.inner.mark_clean(item)
    }
    fn mark_processed(&mut self, item: &LocalItem) -> StoreResult<()> {
        self.inner.mark_processed(item)
    }
    fn progress(&self) -> ProgressCounters {
        self.inner.progress()
    }
    fn log_cursor(&self) -> Cursor {
        self.inner.log_cursor()
    }
    fn set_log_cursor(&mut self, cursor: Cursor) -> StoreResult<()> {
        self.inner.set_log_cursor(cursor)
    }
    fn reset_progress(&mut self) -> StoreResult<()> {
        self.inner.reset_progress()
    }
    fn revision(&self) -> u64 {
        self.inner.revision()
    }
}

#[test]
fn cursor_stays_put_when_a_pull_batch_aborts() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("contacts-1");
    let other = OriginId::new("device-b");
    log.push_from(&other, &id, LogEntry::resource("a", record("a", "FN:One")))
        .unwrap();
    log.push_from(&other, &id, LogEntry::resource("b", record("b", "FN:Two")))
        .unwrap();

    let store = Arc::new(Mutex::new(AddressBook::new(id.clone(), "Personal")));
    let adapter: SharedAdapter = Arc::new(Mutex::new(FlakyAdapter {
        inner: AddressBookAdapter::new(Arc::clone(&store), Arc::new(FlatCodec::new())),
        faults_left: 1,
    }));
    let mut registry = StaticRegistry::new();
    registry.register(Arc::clone(&adapter));

    let engine = SyncEngine::new(
        log,
        Arc::new(registry),
        Arc::new(MemorySyncState::already_synced()),
    );

    // The first pull aborts on the first entry; nothing is committed.
    assert!(matches!(
        engine.sync_collection(&id),
        PassOutcome::Skipped(SkipReason::StoreUnavailable)
    ));
    assert_eq!(adapter.lock().log_cursor(), Cursor::ZERO);
    assert!(store.lock().is_empty());

    // The retry starts at the same cursor and lands the whole batch.
    assert!(matches!(engine.sync_collection(&id), PassOutcome::Success(_)));
    assert_eq!(store.lock().contact("a"), Some("FN:One"));
    assert_eq!(store.lock().contact("b"), Some("FN:Two"));
}

#[test]
fn concurrent_edits_resolve_last_writer_wins() {
    let log = Arc::new(MemoryLog::new());
    let id = CollectionId::new("contacts-1");
    let device_a = ContactDevice::new(Arc::clone(&log), &id);
    let device_b = ContactDevice::new(Arc::clone(&log), &id);

    device_a.store.lock().create_contact_with_uid("ada", "FN:Ada");
    device_a.run();
    device_b.run();

    // Both edit before either syncs; B pushes last.
    device_a.store.lock().edit_contact("ada", "FN:From A");
    device_b.store.lock().edit_contact("ada", "FN:From B");
    device_a.run();
    device_b.run();
    device_a.run();

    assert_eq!(device_a.store.lock().contact("ada"), Some("FN:From B"));
    assert_eq!(device_b.store.lock().contact("ada"), Some("FN:From B"));
}
