//! # AncientKV Core
//!
//! The storage capability contract shared by the server-side backend and
//! the remote client.
//!
//! [`Database`] covers the whole surface of a store handle. Its operations
//! split into two halves (see [`Capability::is_write`]):
//!
//! - reads: `has`, `get`, `has_ancient`, `ancient`, `ancient_range`,
//!   `read_ancients`, `ancients`, `tail`, `ancient_size`, `stat`
//! - writes and lifecycle: everything else
//!
//! Read-only implementers still implement the write half, rejecting every
//! call with [`DbError::WriteNotAllowed`] or [`DbError::NotSupported`].
//!
//! ## Key Invariants
//!
//! - A rejected write leaves the store byte-identical
//! - `has(k)` is true iff `get(k)` does not fail with `NotFound`
//! - `ancient_range` returns at least one item when `start` is retained

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod database;
mod error;

pub use database::{
    empty_iterator, AncientReaderOp, AncientStore, AncientWriteOp, Batch, Capability, Database,
    KeyValueReader, KeyValueStore, KeyValueWriter, KvIterator, Snapshot,
};
pub use error::{DbError, DbResult, NOT_SUPPORTED, WRITE_NOT_ALLOWED};
