//! Network endpoints carrying the RPC API.

mod http;
#[cfg(unix)]
mod ipc;

pub use http::{HttpEndpoint, CBOR_CONTENT_TYPE};
#[cfg(unix)]
pub use ipc::IpcEndpoint;

use crate::api::RpcHandler;
use crate::config::ServiceConfig;
use crate::error::ServerResult;
use std::net::SocketAddr;
use std::sync::Arc;

/// The endpoints started for a service.
#[derive(Default)]
pub struct Endpoints {
    http: Option<HttpEndpoint>,
    #[cfg(unix)]
    ipc: Option<IpcEndpoint>,
}

impl Endpoints {
    /// Starts every endpoint `config` enables.
    pub async fn start(config: &ServiceConfig, handler: Arc<RpcHandler>) -> ServerResult<Self> {
        let mut endpoints = Self::default();

        if config.http_enabled {
            endpoints.http =
                Some(HttpEndpoint::start(&config.http_addr, Arc::clone(&handler)).await?);
        }

        if config.ipc_enabled {
            endpoints.start_ipc(config, handler).await?;
        }

        Ok(endpoints)
    }

    #[cfg(unix)]
    async fn start_ipc(&mut self, config: &ServiceConfig, handler: Arc<RpcHandler>) -> ServerResult<()> {
        if let Some(path) = &config.ipc_path {
            self.ipc = Some(IpcEndpoint::start(path, handler).await?);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    async fn start_ipc(&mut self, _config: &ServiceConfig, _handler: Arc<RpcHandler>) -> ServerResult<()> {
        tracing::warn!("ipc endpoint is only available on unix platforms");
        Ok(())
    }

    /// Returns the bound HTTP address, if HTTP is running.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http.as_ref().map(HttpEndpoint::local_addr)
    }

    /// Returns the HTTP endpoint, if running.
    pub fn http(&self) -> Option<&HttpEndpoint> {
        self.http.as_ref()
    }

    /// Returns the socket endpoint, if running.
    #[cfg(unix)]
    pub fn ipc(&self) -> Option<&IpcEndpoint> {
        self.ipc.as_ref()
    }

    /// Shuts every endpoint down.
    pub async fn shutdown(mut self) {
        if let Some(http) = self.http.take() {
            http.shutdown().await;
        }
        self.shutdown_ipc().await;
    }

    #[cfg(unix)]
    async fn shutdown_ipc(&mut self) {
        if let Some(ipc) = self.ipc.take() {
            ipc.shutdown().await;
        }
    }

    #[cfg(not(unix))]
    async fn shutdown_ipc(&mut self) {}
}
