//! Local socket transport.
//!
//! Each message is a length-prefixed frame (see
//! [`ancientkv_protocol::encode_frame`]). A connection carries any number
//! of calls, answered in order.

use crate::api::RpcHandler;
use crate::error::{ServerError, ServerResult};
use ancientkv_protocol::{
    encode_frame, frame_len, ProtocolError, RpcErrorObject, RpcResponse, FRAME_HEADER_LEN,
    MAX_FRAME_LEN,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A Unix socket listener.
pub struct IpcEndpoint {
    path: PathBuf,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl IpcEndpoint {
    /// Binds the socket at `path` and starts serving on the current runtime.
    ///
    /// A leftover socket file from an earlier run is replaced.
    pub async fn start(path: &Path, handler: Arc<RpcHandler>) -> ServerResult<Self> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let listener = UnixListener::bind(path).map_err(|source| ServerError::Bind {
            addr: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "ipc endpoint bound");

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, _)) => {
                            let handler = Arc::clone(&handler);
                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(stream, handler).await {
                                    tracing::debug!(error = %e, "ipc connection closed");
                                }
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "ipc accept failed"),
                    },
                }
            }
            tracing::info!("ipc endpoint stopped");
        });

        Ok(Self {
            path: path.to_path_buf(),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Returns the socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops accepting connections and removes the socket file.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "ipc endpoint task failed");
            }
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to remove socket");
            }
        }
    }
}

async fn serve_connection(mut stream: UnixStream, handler: Arc<RpcHandler>) -> io::Result<()> {
    loop {
        let mut header = [0u8; FRAME_HEADER_LEN];
        match stream.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }
        let len = frame_len(header).map_err(invalid_data)?;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await?;

        let response = Arc::clone(&handler).dispatch(body).await;
        let frame = frame_response(&response)?;
        stream.write_all(&frame).await?;
    }
}

/// Frames an encoded response. A response too large for one frame is
/// replaced by an internal error for the same request id.
fn frame_response(response: &[u8]) -> io::Result<Vec<u8>> {
    match encode_frame(response) {
        Ok(frame) => Ok(frame),
        Err(ProtocolError::FrameTooLarge(len)) => {
            let id = RpcResponse::decode(response).map(|r| r.id).unwrap_or(0);
            tracing::warn!(id, len, "ipc response exceeds frame limit");
            let failure = RpcResponse::failure(
                id,
                RpcErrorObject::internal(format!(
                    "response of {len} bytes exceeds the {MAX_FRAME_LEN} byte frame limit"
                )),
            );
            encode_frame(&failure.encode().map_err(invalid_data)?).map_err(invalid_data)
        }
        Err(e) => Err(invalid_data(e)),
    }
}

fn invalid_data(err: ancientkv_protocol::ProtocolError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancientkv_protocol::{codes, Value};

    fn unframe(frame: &[u8]) -> RpcResponse {
        let header: [u8; FRAME_HEADER_LEN] = frame[..FRAME_HEADER_LEN].try_into().unwrap();
        let len = frame_len(header).unwrap();
        assert_eq!(frame.len(), FRAME_HEADER_LEN + len);
        RpcResponse::decode(&frame[FRAME_HEADER_LEN..]).unwrap()
    }

    #[test]
    fn small_response_is_framed_as_is() {
        let response = RpcResponse::success(4, Value::Bool(true));
        let frame = frame_response(&response.encode().unwrap()).unwrap();
        assert_eq!(unframe(&frame), response);
    }

    #[test]
    fn oversized_response_becomes_internal_error() {
        let response = RpcResponse::success(9, Value::Bytes(vec![7; MAX_FRAME_LEN]));
        let frame = frame_response(&response.encode().unwrap()).unwrap();

        let answer = unframe(&frame);
        assert_eq!(answer.id, 9);
        let err = answer.into_result().unwrap_err();
        assert_eq!(err.code, codes::INTERNAL_ERROR);
        assert!(err.message.contains("frame limit"));
    }
}
