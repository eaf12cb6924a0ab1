//! # Pimsync Store
//!
//! Local store adapters for pimsync.
//!
//! This crate provides:
//! - The [`CollectionAdapter`] capability trait the engine drives
//! - Three adapters, one per collection kind: [`AddressBookAdapter`],
//!   [`CalendarAdapter`], [`TaskListAdapter`]
//! - The entry codec glue ([`EntryCodec`]) between local items and
//!   log entries
//! - The external item codec contract ([`ItemCodec`]) plus a
//!   reference text codec ([`FlatCodec`])
//! - JSON-file persistence for the kind-specific stores
//!
//! ## Key Invariants
//!
//! - An item's uid is minted once and never changes
//! - A deleted row is purged only after its tombstone push is
//!   confirmed durable (`mark_clean`)
//! - Applying log entries is idempotent; no-ops perform zero store
//!   mutations (observable through the store revision counter)

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod address_book;
mod calendar;
mod codec;
mod entry_codec;
mod error;
mod metadata;
mod persist;
mod table;
mod task_list;

pub use adapter::{ApplyOutcome, CollectionAdapter};
pub use address_book::{AddressBook, AddressBookAdapter};
pub use calendar::{Calendar, CalendarAdapter};
pub use codec::{CodecError, CodecResult, DecodedItem, FlatCodec, ItemCodec};
pub use entry_codec::{format_color, parse_color, EntryCodec, ResourceChange};
pub use error::{StoreError, StoreResult};
pub use persist::{load_store, save_store};
pub use task_list::{TaskList, TaskListAdapter};
