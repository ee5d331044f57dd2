use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, trace};
use xenapi_core::{CallIdAllocator, WireValue};

use crate::jsonrpc::{decode_response, encode_request};
use crate::transport::{Transport, TransportError, WireRequest};

/// JSON-RPC over HTTP(S), one POST per call.
#[derive(Debug)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    ids: CallIdAllocator,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            ids: CallIdAllocator::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_and_receive(&self, request: WireRequest) -> Result<WireValue, TransportError> {
        let id = self.ids.allocate();
        let body = encode_request(&request, id)?;

        debug!(url = %self.url, method = %request.method, %id, "sending JSON-RPC request");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Connection(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        trace!("Response body: {}", String::from_utf8_lossy(&bytes));
        decode_response(&bytes, Some(id))
    }
}
