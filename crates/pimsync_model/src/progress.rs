//! Per-collection progress counters.

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::atomic::{AtomicI64, Ordering};

/// Persisted per-collection progress state.
///
/// Stored with the local store alongside the collection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressCounters {
    /// Number of item entries this device is responsible for in the
    /// log: +1 per first-ever push, −1 per confirmed deletion push,
    /// never changed on updates.
    pub num_processed_entries: i64,
    /// Last collection color pushed to or applied from the log.
    pub shadow_color: Option<i32>,
}

/// Live, shareable view over [`ProgressCounters`].
///
/// Supports atomic increment/decrement of the processed-entry count
/// and compare-and-set on the shadow color. A tracker can be read at
/// any time without a sync pass in progress.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    entries: AtomicI64,
    shadow_color: Mutex<Option<i32>>,
}

impl ProgressTracker {
    /// Creates a tracker with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker from persisted counters.
    pub fn from_counters(counters: ProgressCounters) -> Self {
        Self {
            entries: AtomicI64::new(counters.num_processed_entries),
            shadow_color: Mutex::new(counters.shadow_color),
        }
    }

    /// Returns a point-in-time snapshot.
    pub fn snapshot(&self) -> ProgressCounters {
        ProgressCounters {
            num_processed_entries: self.entries.load(Ordering::SeqCst),
            shadow_color: *self.shadow_color.lock(),
        }
    }

    /// Returns the current processed-entry count.
    pub fn num_processed_entries(&self) -> i64 {
        self.entries.load(Ordering::SeqCst)
    }

    /// Increments the processed-entry count, returning the new value.
    pub fn increment(&self) -> i64 {
        self.entries.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decrements the processed-entry count, returning the new value.
    pub fn decrement(&self) -> i64 {
        self.entries.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Resets the processed-entry count to zero.
    pub fn reset(&self) {
        self.entries.store(0, Ordering::SeqCst);
        *self.shadow_color.lock() = None;
    }

    /// Returns the current shadow color.
    pub fn shadow_color(&self) -> Option<i32> {
        *self.shadow_color.lock()
    }

    /// Unconditionally sets the shadow color.
    pub fn set_shadow_color(&self, color: Option<i32>) {
        *self.shadow_color.lock() = color;
    }

    /// Sets the shadow color to `new` only if it currently equals
    /// `current`. Returns true if the swap happened.
    pub fn compare_and_set_color(&self, current: Option<i32>, new: Option<i32>) -> bool {
        let mut guard = self.shadow_color.lock();
        if *guard == current {
            *guard = new;
            true
        } else {
            false
        }
    }
}

impl Serialize for ProgressTracker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProgressTracker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ProgressCounters::deserialize(deserializer).map(Self::from_counters)
    }
}

impl Clone for ProgressTracker {
    fn clone(&self) -> Self {
        Self::from_counters(self.snapshot())
    }
}
