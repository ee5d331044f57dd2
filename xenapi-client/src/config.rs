use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the pool master
    pub url: String,
    /// Transport-level request timeout in milliseconds
    pub timeout_ms: u64,
    /// Identifies this client in the server's session list
    pub originator: String,
    /// API version string sent at login
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/jsonrpc".to_string(),
            timeout_ms: 30000,
            originator: "xenapi-rs".to_string(),
            api_version: "1.0".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new_with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// HTTP transport for this configuration.
    #[cfg(feature = "http")]
    pub fn http_transport(&self) -> Result<xenapi_transport::HttpTransport, xenapi_transport::TransportError> {
        xenapi_transport::HttpTransport::new(self.url.clone(), self.timeout())
    }
}
