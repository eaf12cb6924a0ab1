//! # Pimsync Log
//!
//! The append-only log contract for pimsync.
//!
//! This crate provides:
//! - The [`LogStore`] trait consumed by the reconciliation engine
//! - The [`LogError`] type with its retryability split
//! - [`MemoryLog`], an in-memory reference implementation
//!
//! The log is a pre-existing external component: path-keyed,
//! append-only, shared between devices, converging last-writer-wins
//! per (path, key). Only the contract required of it lives here.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;

pub use error::{LogError, LogResult};
pub use memory::MemoryLog;
pub use store::LogStore;
