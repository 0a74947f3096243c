//! Server configuration.

use crate::error::{ServerError, ServerResult};
use ancientkv_storage::StorageConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP listen address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8500";

/// Configuration for the RPC service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Whether to serve over a local socket.
    pub ipc_enabled: bool,
    /// Socket path for the local transport.
    pub ipc_path: Option<PathBuf>,
    /// Whether to serve over HTTP.
    pub http_enabled: bool,
    /// HTTP listen address.
    pub http_addr: String,
    /// Deadline for a single call.
    pub request_timeout: Duration,
    /// The store to serve.
    pub storage: StorageConfig,
}

impl ServiceConfig {
    /// Creates a configuration serving `storage` over HTTP on the default
    /// address.
    pub fn new(storage: StorageConfig) -> Self {
        Self {
            ipc_enabled: false,
            ipc_path: None,
            http_enabled: true,
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            request_timeout: Duration::from_secs(30),
            storage,
        }
    }

    /// Enables the local socket transport at `path`.
    pub fn with_ipc(mut self, path: impl Into<PathBuf>) -> Self {
        self.ipc_enabled = true;
        self.ipc_path = Some(path.into());
        self
    }

    /// Enables HTTP on `addr`.
    pub fn with_http(mut self, addr: impl Into<String>) -> Self {
        self.http_enabled = true;
        self.http_addr = addr.into();
        self
    }

    /// Disables HTTP.
    pub fn without_http(mut self) -> Self {
        self.http_enabled = false;
        self
    }

    /// Sets the per-call deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Checks that every enabled transport has an address.
    pub fn validate(&self) -> ServerResult<()> {
        if self.ipc_enabled && self.ipc_path.is_none() {
            return Err(ServerError::Config(
                "ipc is enabled but no ipc path is set".into(),
            ));
        }
        if self.http_enabled && self.http_addr.is_empty() {
            return Err(ServerError::Config(
                "http is enabled but no http address is set".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ServerError::Config("request timeout must be positive".into()));
        }
        Ok(())
    }
}
