// In-memory transport driven by a closure.
//
// Stands in for a server in tests and offline tooling: every request is
// recorded, and the handler decides what comes back.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use xenapi_core::{Envelope, WireValue};

use crate::transport::{Transport, TransportError, WireRequest};

type Handler = dyn Fn(&WireRequest) -> Result<WireValue, TransportError> + Send + Sync;

#[derive(Clone)]
pub struct ScriptedTransport {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<WireRequest>>>,
}

impl ScriptedTransport {
    /// The handler returns a full response envelope (see [`Envelope::to_wire`]).
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&WireRequest) -> Result<WireValue, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replays `responses` in order, one per request. Requests past the end
    /// fail with a connection error.
    pub fn queued(responses: Vec<Result<Envelope, TransportError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            let next = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
            match next {
                Some(Ok(envelope)) => Ok(envelope.to_wire()),
                Some(Err(err)) => Err(err),
                None => Err(TransportError::Connection("script exhausted".into())),
            }
        })
    }

    /// Every request refused as if the host were unreachable.
    pub fn unreachable() -> Self {
        Self::new(|_| Err(TransportError::Connection("connection refused".into())))
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<WireRequest> {
        self.log().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log().len()
    }

    pub fn last_request(&self) -> Option<WireRequest> {
        self.log().last().cloned()
    }

    fn log(&self) -> MutexGuard<'_, Vec<WireRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("requests", &self.request_count())
            .finish()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_and_receive(&self, request: WireRequest) -> Result<WireValue, TransportError> {
        self.log().push(request.clone());
        (self.handler)(&request)
    }
}
