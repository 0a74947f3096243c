//! Error types for the storage contract.

use ancientkv_storage::StorageError;
use thiserror::Error;

/// Result type for contract operations.
pub type DbResult<T> = Result<T, DbError>;

/// Message of [`DbError::WriteNotAllowed`].
pub const WRITE_NOT_ALLOWED: &str = "write endpoints are not enabled";

/// Message of [`DbError::NotSupported`].
pub const NOT_SUPPORTED: &str = "this operation is not supported";

/// Errors surfaced by any implementer of [`crate::Database`].
#[derive(Debug, Error)]
pub enum DbError {
    /// The key or ancient item does not exist.
    #[error("not found")]
    NotFound,

    /// No ancient table with this kind exists.
    #[error("unknown ancient table: {0}")]
    UnknownTable(String),

    /// The ancient index precedes the table's retained tail.
    #[error("ancient index {index} out of range for table {kind} (tail {tail})")]
    OutOfRange {
        /// Table kind.
        kind: String,
        /// Requested index.
        index: u64,
        /// Oldest retained index.
        tail: u64,
    },

    /// A mutating call reached the server-side backend.
    #[error("write endpoints are not enabled")]
    WriteNotAllowed,

    /// A mutating or lifecycle call was made on the remote client.
    #[error("this operation is not supported")]
    NotSupported,

    /// The transport failed to deliver the call.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote response could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The storage engine failed.
    #[error("engine error: {0}")]
    Engine(String),
}

impl DbError {
    /// Returns true if this error is one of the fixed write rejections.
    pub fn is_write_rejection(&self) -> bool {
        matches!(self, DbError::WriteNotAllowed | DbError::NotSupported)
    }

    /// Returns true if the requested data does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound)
    }
}

impl From<StorageError> for DbError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownTable(kind) => DbError::UnknownTable(kind),
            StorageError::ItemOutOfBounds { .. } => DbError::NotFound,
            other => DbError::Engine(other.to_string()),
        }
    }
}
