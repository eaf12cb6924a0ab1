//! # Pimsync Model
//!
//! Shared data model for pimsync.
//!
//! This crate provides:
//! - Collection kinds and identity ([`CollectionKind`], [`CollectionId`], [`CollectionInfo`])
//! - The local item record ([`LocalItem`])
//! - Log entry types ([`EntryPath`], [`LogEntry`], [`SequencedEntry`], [`Cursor`])
//! - Per-collection progress counters ([`ProgressCounters`], [`ProgressTracker`])
//!
//! ## Key Invariants
//!
//! - An item's uid is immutable for its lifetime in a collection and
//!   maps 1:1 to the log path `resources/<uid>`
//! - A log entry with a null value at a resource path is a tombstone
//! - `num_processed_entries` decreases by 1 on a confirmed deletion
//!   push and increases by 1 only on a first-ever push

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod entry;
mod item;
mod kind;
mod progress;

pub use collection::{CollectionId, CollectionInfo};
pub use entry::{Cursor, EntryPath, LogEntry, OriginId, PathPrefix, SequencedEntry, Value};
pub use item::LocalItem;
pub use kind::CollectionKind;
pub use progress::{ProgressCounters, ProgressTracker};
