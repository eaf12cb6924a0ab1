//! # Pimsync Engine
//!
//! The reconciliation engine synchronizing local PIM stores through
//! the shared append-only log.
//!
//! This crate provides:
//! - [`SyncEngine`] - Per-collection reconciliation passes and the
//!   flag-gated initial sync
//! - [`CollectionRegistry`] / [`StaticRegistry`] - Adapter lookup
//! - [`SyncStateStore`] / [`MemorySyncState`] - The device's
//!   initial-sync flag
//! - [`SyncError`] - Pass-aborting errors with retryability
//!
//! ## Pass Shape
//!
//! One pass per collection: precondition probe, metadata delta push,
//! item push (tombstones first), pull and apply, single cursor
//! commit. Per-item codec failures never abort a pass; store and log
//! faults do, leaving the durable state consistent for the next run.
//!
//! ## Example
//!
//! ```
//! use pimsync_engine::{MemorySyncState, StaticRegistry, SyncEngine};
//! use pimsync_log::MemoryLog;
//! use pimsync_model::CollectionId;
//! use pimsync_store::{AddressBook, AddressBookAdapter, FlatCodec};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let store = Arc::new(Mutex::new(AddressBook::new(
//!     CollectionId::new("contacts-1"),
//!     "Personal",
//! )));
//! store.lock().create_contact_with_uid("abc", "FN:Ada");
//!
//! let mut registry = StaticRegistry::new();
//! registry.register(Arc::new(Mutex::new(AddressBookAdapter::new(
//!     Arc::clone(&store),
//!     Arc::new(FlatCodec::new()),
//! ))));
//!
//! let engine = SyncEngine::new(
//!     Arc::new(MemoryLog::new()),
//!     Arc::new(registry),
//!     Arc::new(MemorySyncState::new()),
//! );
//! let outcomes = engine.run_reconciliation().unwrap();
//! assert_eq!(outcomes.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod initial;
mod registry;

pub use engine::{PassOutcome, PassSummary, SkipReason, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use registry::{
    CollectionRegistry, MemorySyncState, SharedAdapter, StaticRegistry, SyncStateStore,
};
