use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use xenapi_core::{Fault, WireValue};

/// One method invocation, parameters already encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: String,
    pub params: Vec<WireValue>,
}

impl WireRequest {
    pub fn new(method: impl Into<String>, params: Vec<WireValue>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<TransportError> for Fault {
    fn from(err: TransportError) -> Self {
        match err {
            // A malformed response is protocol skew; resending will not help.
            TransportError::Codec(_) | TransportError::Protocol(_) => {
                Fault::type_mismatch("JSON-RPC response", err.to_string())
            }
            TransportError::Connection(_) | TransportError::Timeout | TransportError::Http { .. } => {
                Fault::transport(err.to_string())
            }
        }
    }
}

/// Sends a request and waits for the complete response envelope.
///
/// Implementations return the envelope struct (`Status` plus `Value` or
/// `ErrorDescription`) untouched; interpreting it is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_and_receive(&self, request: WireRequest) -> Result<WireValue, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send_and_receive(&self, request: WireRequest) -> Result<WireValue, TransportError> {
        (**self).send_and_receive(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send_and_receive(&self, request: WireRequest) -> Result<WireValue, TransportError> {
        (**self).send_and_receive(request).await
    }
}
