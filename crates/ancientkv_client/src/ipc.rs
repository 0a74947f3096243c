//! Local socket transport.

use crate::config::ClientConfig;
use crate::transport::RpcTransport;
use ancientkv_core::{DbError, DbResult};
use ancientkv_protocol::{encode_frame, frame_len, FRAME_HEADER_LEN};
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sends length-prefixed frames over one Unix socket connection.
///
/// Calls on the same transport are serialized. A call that fails midway
/// leaves unread bytes on the connection, so the connection is dropped and
/// the next call dials a fresh one.
pub struct IpcTransport {
    path: PathBuf,
    timeout: Duration,
    stream: Mutex<Option<UnixStream>>,
}

impl IpcTransport {
    /// Connects to the socket at `path`.
    pub fn connect(path: impl AsRef<Path>, config: &ClientConfig) -> DbResult<Self> {
        let path = path.as_ref();
        let stream = dial(path, config.timeout).map_err(DbError::Transport)?;
        tracing::debug!(path = %path.display(), "ipc transport connected");

        Ok(Self {
            path: path.to_path_buf(),
            timeout: config.timeout,
            stream: Mutex::new(Some(stream)),
        })
    }

    /// Returns the socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn dial(path: &Path, timeout: Duration) -> Result<UnixStream, String> {
    let stream = UnixStream::connect(path).map_err(|e| format!("{}: {e}", path.display()))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| e.to_string())?;
    Ok(stream)
}

fn exchange(stream: &mut UnixStream, frame: &[u8]) -> Result<Vec<u8>, String> {
    stream.write_all(frame).map_err(|e| e.to_string())?;

    let mut header = [0u8; FRAME_HEADER_LEN];
    stream.read_exact(&mut header).map_err(|e| e.to_string())?;
    let len = frame_len(header).map_err(|e| e.to_string())?;
    let mut response = vec![0u8; len];
    stream.read_exact(&mut response).map_err(|e| e.to_string())?;
    Ok(response)
}

impl RpcTransport for IpcTransport {
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, String> {
        let frame = encode_frame(&body).map_err(|e| e.to_string())?;
        let mut slot = self.stream.lock();
        let mut stream = match slot.take() {
            Some(stream) => stream,
            None => {
                tracing::debug!(path = %self.path.display(), "ipc transport reconnecting");
                dial(&self.path, self.timeout)?
            }
        };

        let response = exchange(&mut stream, &frame)?;
        *slot = Some(stream);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_socket_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = IpcTransport::connect(dir.path().join("absent.ipc"), &ClientConfig::default());
        assert!(matches!(result, Err(DbError::Transport(_))));
    }

    #[test]
    fn frames_round_trip_over_socket() {
        use std::os::unix::net::UnixListener;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.ipc");
        let listener = UnixListener::bind(&path).unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut header = [0u8; FRAME_HEADER_LEN];
            stream.read_exact(&mut header).unwrap();
            let mut body = vec![0u8; frame_len(header).unwrap()];
            stream.read_exact(&mut body).unwrap();
            body.reverse();
            stream.write_all(&encode_frame(&body).unwrap()).unwrap();
        });

        let transport = IpcTransport::connect(&path, &ClientConfig::default()).unwrap();
        assert_eq!(transport.send(vec![1, 2, 3]).unwrap(), vec![3, 2, 1]);
        server.join().unwrap();
    }

    #[test]
    fn timed_out_call_does_not_desync_later_calls() {
        use std::os::unix::net::UnixListener;

        fn read_request(stream: &mut UnixStream) -> Vec<u8> {
            let mut header = [0u8; FRAME_HEADER_LEN];
            stream.read_exact(&mut header).unwrap();
            let mut body = vec![0u8; frame_len(header).unwrap()];
            stream.read_exact(&mut body).unwrap();
            body
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.ipc");
        let listener = UnixListener::bind(&path).unwrap();
        let server = std::thread::spawn(move || {
            let (mut slow, _) = listener.accept().unwrap();
            let body = read_request(&mut slow);
            std::thread::sleep(Duration::from_millis(600));
            let _ = slow.write_all(&encode_frame(&body).unwrap());

            let (mut fresh, _) = listener.accept().unwrap();
            for _ in 0..2 {
                let body = read_request(&mut fresh);
                fresh.write_all(&encode_frame(&body).unwrap()).unwrap();
            }
        });

        let config = ClientConfig::default().with_timeout(Duration::from_millis(300));
        let transport = IpcTransport::connect(&path, &config).unwrap();
        assert!(transport.send(vec![1]).is_err());
        assert_eq!(transport.send(vec![2]).unwrap(), vec![2]);
        assert_eq!(transport.send(vec![3]).unwrap(), vec![3]);
        server.join().unwrap();
    }
}
