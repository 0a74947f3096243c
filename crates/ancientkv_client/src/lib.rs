//! # AncientKV Client
//!
//! Remote, read-only access to an AncientKV server.
//!
//! [`DatabaseClient`] implements the same
//! [`Database`](ancientkv_core::Database) contract as the server-side
//! backend, forwarding each read as one call over an [`RpcTransport`]:
//!
//! - [`HttpTransport`]: CBOR bodies posted to the server's HTTP endpoint
//! - `IpcTransport`: length-prefixed frames over a Unix socket
//! - [`LoopbackClient`]: direct calls into an in-process server
//!
//! ## Key Invariants
//!
//! - Writes and lifecycle calls fail with `NotSupported` and make no call
//! - A read returns exactly what the backend would return locally,
//!   errors included
//!
//! ```rust,ignore
//! use ancientkv_client::{dial, ClientConfig};
//!
//! let db = dial("http://127.0.0.1:8500", &ClientConfig::default())?;
//! let frozen = db.ancients()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod http;
#[cfg(unix)]
mod ipc;
mod transport;

pub use client::DatabaseClient;
pub use config::ClientConfig;
pub use http::HttpTransport;
#[cfg(unix)]
pub use ipc::IpcTransport;
pub use transport::{LoopbackClient, LoopbackServer, RpcTransport};

use ancientkv_core::{Database, DbError, DbResult};

/// Scheme prefix selecting the local socket transport.
pub const IPC_SCHEME: &str = "ipc://";

/// Connects to the server at `endpoint`.
///
/// `http://host:port` dials HTTP. `ipc:///path/to/socket`, or a bare
/// filesystem path, dials the local socket.
pub fn dial(endpoint: &str, config: &ClientConfig) -> DbResult<Box<dyn Database>> {
    if endpoint.starts_with("http://") {
        let transport = HttpTransport::new(endpoint, config)?;
        tracing::debug!(endpoint, "dialed http endpoint");
        return Ok(Box::new(DatabaseClient::with_config(transport, config)));
    }

    let path = endpoint.strip_prefix(IPC_SCHEME).unwrap_or(endpoint);
    if path.starts_with('/') || path.starts_with('.') {
        return dial_ipc(path, config);
    }

    Err(DbError::Transport(format!("unsupported endpoint: {endpoint}")))
}

#[cfg(unix)]
fn dial_ipc(path: &str, config: &ClientConfig) -> DbResult<Box<dyn Database>> {
    let transport = IpcTransport::connect(path, config)?;
    Ok(Box::new(DatabaseClient::with_config(transport, config)))
}

#[cfg(not(unix))]
fn dial_ipc(path: &str, _config: &ClientConfig) -> DbResult<Box<dyn Database>> {
    Err(DbError::Transport(format!(
        "local socket transport is not available on this platform: {path}"
    )))
}
