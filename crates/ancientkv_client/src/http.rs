//! HTTP transport.

use crate::config::ClientConfig;
use crate::transport::RpcTransport;
use ancientkv_core::{DbError, DbResult};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

const CBOR_CONTENT_TYPE: &str = "application/cbor";

/// Posts CBOR request bodies to a server URL.
///
/// Blocking: must not be used from inside an async runtime.
pub struct HttpTransport {
    url: String,
    client: Client,
}

impl HttpTransport {
    /// Creates a transport to `url` (e.g. `http://127.0.0.1:8500`).
    pub fn new(url: impl Into<String>, config: &ClientConfig) -> DbResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DbError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Returns the server URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for HttpTransport {
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, CBOR_CONTENT_TYPE)
            .body(body)
            .send()
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("server answered with status {status}"));
        }
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn transport_creation() {
        let transport = HttpTransport::new("http://127.0.0.1:8500", &ClientConfig::default())
            .unwrap();
        assert_eq!(transport.url(), "http://127.0.0.1:8500");
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(500));
        // Port 9 (discard) is almost never listening locally.
        let transport = HttpTransport::new("http://127.0.0.1:9", &config).unwrap();
        assert!(transport.send(vec![0xa0]).is_err());
    }
}
