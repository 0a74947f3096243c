//! Configuration for the remote client.

use std::time::Duration;

/// Configuration for a remote connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for a single call, including connection setup.
    pub timeout: Duration,
    /// Namespace the remote API is published under.
    pub namespace: String,
}

impl ClientConfig {
    /// Creates a configuration with a 30 second deadline.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            namespace: ancientkv_protocol::API_NAMESPACE.to_string(),
        }
    }

    /// Sets the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the remote namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
