//! Serve command implementation.

use super::StoreArgs;
use ancientkv_server::{Service, ServiceConfig, DEFAULT_HTTP_ADDR};
use clap::{ArgAction, Args};
use std::path::PathBuf;

/// Options of the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Turn on the local socket server
    #[arg(
        long,
        env = "IPC_ENABLED",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true"
    )]
    pub ipc_enabled: bool,

    /// Local socket path
    #[arg(long, env = "IPC_PATH")]
    pub ipc_path: Option<PathBuf>,

    /// Turn on the HTTP server
    #[arg(
        long,
        env = "HTTP_ENABLED",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub http_enabled: bool,

    /// HTTP listen address
    #[arg(long, env = "HTTP_PATH", default_value = DEFAULT_HTTP_ADDR)]
    pub http_path: String,

    /// Per-call deadline in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout: u64,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl ServeArgs {
    /// Builds the service configuration.
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new(self.store.storage_config())
            .with_request_timeout(std::time::Duration::from_secs(self.request_timeout));
        config.ipc_enabled = self.ipc_enabled;
        config.ipc_path = self.ipc_path.clone();
        config.http_enabled = self.http_enabled;
        config.http_addr = self.http_path.clone();
        config
    }
}

/// Runs the server until interrupted.
pub async fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting ancientkv server");

    let config = args.service_config();
    tracing::info!(?config, "server configuration");
    let service = Service::new(config)?;

    service.serve()?;
    if !service.config().ipc_enabled {
        tracing::info!("ipc server is disabled");
    }
    if !service.config().http_enabled {
        tracing::info!("http server is disabled");
    }
    let endpoints = match service.start_endpoints().await {
        Ok(endpoints) => endpoints,
        Err(e) => {
            service.stop();
            service.wait().await?;
            return Err(e.into());
        }
    };
    if let Some(addr) = endpoints.http_addr() {
        tracing::info!(%addr, "serving http");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");

    endpoints.shutdown().await;
    service.stop();
    service.wait().await?;
    Ok(())
}
