//! Error types for storage engine operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur inside a storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of a file.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// A data file is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The engine has been closed.
    #[error("storage is closed")]
    Closed,

    /// No ancient table with this kind exists.
    #[error("unknown ancient table: {0}")]
    UnknownTable(String),

    /// The ancient item is outside the table's retained range.
    #[error("ancient item {index} out of bounds in table {kind}")]
    ItemOutOfBounds {
        /// Table kind.
        kind: String,
        /// Requested item index.
        index: u64,
    },

    /// The engine does not report this statistic.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// Opening the store would exceed the configured file handle allowance.
    #[error("file handle limit exceeded: need {needed}, allowed {allowed}")]
    HandleLimit {
        /// Handles the store needs.
        needed: usize,
        /// Handles configured.
        allowed: usize,
    },
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}
