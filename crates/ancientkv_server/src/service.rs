//! Service lifecycle.

use crate::api::{ApiDescriptor, PublicApi, RpcHandler};
use crate::backend::Backend;
use crate::config::ServiceConfig;
use crate::endpoint::Endpoints;
use crate::error::{ServerError, ServerResult};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Lifecycle state of a [`Service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed, not yet serving.
    Created,
    /// Serving calls.
    Serving,
    /// Stop requested or completed.
    Stopped,
}

/// The read-only RPC service.
///
/// Owns the backend and publishes its read API. The lifecycle is
/// `serve` → `stop` → `wait`; `wait` returns once the service loop has
/// ended and the engine has been released.
pub struct Service {
    config: ServiceConfig,
    backend: Arc<Backend>,
    apis: Vec<ApiDescriptor>,
    handler: Arc<RpcHandler>,
    state: RwLock<ServiceState>,
    quit: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    released: Mutex<bool>,
}

impl Service {
    /// Opens the store named by `config` and builds the service over it.
    pub fn new(config: ServiceConfig) -> ServerResult<Self> {
        config.validate()?;
        let backend = Backend::open(&config.storage)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Builds the service over an already opened backend.
    pub fn with_backend(config: ServiceConfig, backend: Backend) -> Self {
        let backend = Arc::new(backend);
        let api = Arc::new(PublicApi::new(Arc::clone(&backend)));
        let apis = vec![ApiDescriptor::read_api(api)];
        let handler = Arc::new(RpcHandler::new(&apis, config.request_timeout));

        Self {
            config,
            backend,
            apis,
            handler,
            state: RwLock::new(ServiceState::Created),
            quit: Mutex::new(None),
            task: Mutex::new(None),
            released: Mutex::new(false),
        }
    }

    /// Returns the APIs this service publishes.
    pub fn apis(&self) -> &[ApiDescriptor] {
        &self.apis
    }

    /// Returns the dispatcher for the published APIs.
    pub fn handler(&self) -> Arc<RpcHandler> {
        Arc::clone(&self.handler)
    }

    /// Returns the backend.
    pub fn backend(&self) -> Arc<Backend> {
        Arc::clone(&self.backend)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Starts the service loop on the current runtime.
    ///
    /// Must be called from within a tokio runtime, once.
    pub fn serve(&self) -> ServerResult<()> {
        let mut state = self.state.write();
        if *state != ServiceState::Created {
            return Err(ServerError::InvalidState(format!(
                "serve called in state {:?}",
                *state
            )));
        }

        let (quit_tx, quit_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _ = quit_rx.await;
            tracing::info!("service loop stopping");
        });

        *self.quit.lock() = Some(quit_tx);
        *self.task.lock() = Some(task);
        *state = ServiceState::Serving;
        tracing::info!("service started");
        Ok(())
    }

    /// Signals the service loop to end. Calling it again has no effect.
    pub fn stop(&self) {
        if let Some(quit) = self.quit.lock().take() {
            let _ = quit.send(());
            tracing::info!("service stop requested");
        }
        *self.state.write() = ServiceState::Stopped;
    }

    /// Starts the transport endpoints enabled in the configuration.
    pub async fn start_endpoints(&self) -> ServerResult<Endpoints> {
        Endpoints::start(&self.config, self.handler()).await
    }

    /// Waits for the service loop to end, then releases the engine.
    ///
    /// Returns immediately once the engine has been released.
    pub async fn wait(&self) -> ServerResult<()> {
        if self.state() == ServiceState::Created {
            return Err(ServerError::InvalidState("wait called before serve".into()));
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.await
                .map_err(|e| ServerError::Internal(format!("service loop failed: {e}")))?;
        }

        let mut released = self.released.lock();
        if !*released {
            self.backend.release()?;
            *released = true;
            tracing::info!("engine released");
        }
        Ok(())
    }
}
