//! HTTP transport.

use crate::api::RpcHandler;
use crate::error::{ServerError, ServerResult};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Content type of request and response bodies.
pub const CBOR_CONTENT_TYPE: &str = "application/cbor";

/// An HTTP listener answering `POST /` with CBOR-encoded calls.
///
/// `GET /health` answers `ok` while the listener runs.
pub struct HttpEndpoint {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HttpEndpoint {
    /// Binds `addr` and starts serving on the current runtime.
    pub async fn start(addr: &str, handler: Arc<RpcHandler>) -> ServerResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "http endpoint bound");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(handler);
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
                tracing::info!("http endpoint received shutdown signal");
            });
            if let Err(e) = server.await {
                tracing::error!(error = %e, "http endpoint failed");
            }
            tracing::info!("http endpoint stopped");
        });

        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the URL clients should dial.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stops accepting calls and waits for in-flight ones to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "http endpoint task failed");
            }
        }
    }
}

fn router(handler: Arc<RpcHandler>) -> Router {
    Router::new()
        .route("/", post(rpc))
        .route("/health", get(health))
        .with_state(handler)
}

async fn rpc(State(handler): State<Arc<RpcHandler>>, body: Bytes) -> impl IntoResponse {
    let response = handler.dispatch(body.to_vec()).await;
    ([(header::CONTENT_TYPE, CBOR_CONTENT_TYPE)], response)
}

async fn health() -> &'static str {
    "ok"
}
