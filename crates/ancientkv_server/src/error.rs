//! Error types for the server.

use ancientkv_storage::StorageError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The store could not be opened or released.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A transport endpoint could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address or socket path.
        addr: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A lifecycle call arrived in the wrong state.
    #[error("invalid service state: {0}")]
    InvalidState(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if the error comes from the caller's configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, ServerError::Config(_) | ServerError::Bind { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::Config("no path".into()).is_config_error());
        assert!(!ServerError::Internal("oops".into()).is_config_error());
    }

    #[test]
    fn error_display() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:8500".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("127.0.0.1:8500"));
    }
}
