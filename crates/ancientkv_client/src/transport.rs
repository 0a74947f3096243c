//! Transport layer abstraction for remote calls.

/// Carries one encoded request to the server and returns the encoded
/// response.
///
/// Implementations exist for HTTP, local sockets and in-process loopback.
/// A transport failure is reported as text and surfaces to the caller as
/// [`DbError::Transport`](ancientkv_core::DbError::Transport).
pub trait RpcTransport: Send + Sync {
    /// Sends a request body and waits for the response body.
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, String>;
}

impl<T: RpcTransport + ?Sized> RpcTransport for Box<T> {
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, String> {
        (**self).send(body)
    }
}

/// Trait for servers that can answer loopback requests.
pub trait LoopbackServer {
    /// Answers an encoded request with an encoded response.
    fn handle_request(&self, body: &[u8]) -> Vec<u8>;
}

/// A transport that hands requests directly to an in-process server.
///
/// Useful for testing without network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a loopback transport to `server`.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

impl<S: LoopbackServer + Send + Sync> RpcTransport for LoopbackClient<S> {
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, String> {
        Ok(self.server.handle_request(&body))
    }
}
