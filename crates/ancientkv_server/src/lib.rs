//! # AncientKV Server
//!
//! Read-only RPC server for AncientKV stores.
//!
//! This crate provides:
//! - [`Backend`], a [`Database`](ancientkv_core::Database) that serves
//!   reads from a storage engine and rejects every write
//! - [`PublicApi`] and [`RpcHandler`], the read API published under the
//!   `leveldb` namespace and its method dispatcher
//! - HTTP and local socket endpoints
//! - [`Service`], which ties the above to a start/stop lifecycle
//!
//! # Write rejection
//!
//! Writes are refused twice over. The dispatcher has no route for any
//! write method, so remote callers get "method not found". In-process
//! callers holding the backend get `DbError::WriteNotAllowed`
//! and the store stays untouched.
//!
//! ```rust,ignore
//! use ancientkv_server::{Service, ServiceConfig};
//! use ancientkv_storage::StorageConfig;
//!
//! let config = ServiceConfig::new(StorageConfig::new("/data/chaindata"));
//! let service = Service::new(config)?;
//! service.serve()?;
//! let endpoints = service.start_endpoints().await?;
//! // ...
//! endpoints.shutdown().await;
//! service.stop();
//! service.wait().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod api;
mod backend;
mod config;
mod endpoint;
mod error;
mod service;

pub use ancientkv_protocol::{API_NAMESPACE, API_VERSION};
pub use api::{ApiDescriptor, PublicApi, RpcHandler};
pub use backend::Backend;
pub use config::{ServiceConfig, DEFAULT_HTTP_ADDR};
#[cfg(unix)]
pub use endpoint::IpcEndpoint;
pub use endpoint::{Endpoints, HttpEndpoint, CBOR_CONTENT_TYPE};
pub use error::{ServerError, ServerResult};
pub use service::{Service, ServiceState};
