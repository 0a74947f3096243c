//! # AncientKV Storage
//!
//! Storage engine interface and engines for AncientKV.
//!
//! A store has two tiers:
//!
//! - a flat key-value tier of opaque keys and values
//! - an ancient tier of append-only tables, one per record kind, whose items
//!   are addressed by a zero-based index within a retained `[tail, head)`
//!   range
//!
//! ## Available Engines
//!
//! - [`InMemoryEngine`] - For testing and ephemeral stores
//! - [`FileEngine`] - Read-only engine over a store directory
//!
//! The data files read by [`FileEngine`] are produced with [`KvLog`] and
//! [`FreezerTable`].
//!
//! ## Example
//!
//! ```rust
//! use ancientkv_storage::{InMemoryEngine, StorageEngine, TableBounds};
//!
//! let engine = InMemoryEngine::new();
//! engine.append_ancient("headers", b"h0");
//! assert_eq!(engine.table_bounds("headers").unwrap(), TableBounds::new(0, 1));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod disk;
mod engine;
mod error;
mod file;
mod freezer;
mod kvlog;
mod memory;

pub use config::{kv_log_path, StorageConfig, DEFAULT_HANDLES, DEFAULT_NAMESPACE, MIN_CACHE_SIZE};
pub use disk::FileEngine;
pub use engine::{KvStats, StorageEngine, TableBounds};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use freezer::{table_kinds, FreezerTable, INDEX_HEADER_LEN};
pub use kvlog::{scan as scan_kv_log, KvLog, ValueRef, TOMBSTONE};
pub use memory::InMemoryEngine;
