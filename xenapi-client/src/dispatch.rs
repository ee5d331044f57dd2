// Call dispatch.
//
// Serialises the parameters, hands the request to the transport, unwraps the
// response envelope and decodes the payload against the caller's descriptor.
// Every outcome comes back as a value; nothing is latched anywhere.

use tracing::{debug, warn};
use xenapi_core::{DecodeContext, Envelope, Fault, TypeDescriptor, TypedValue, Value, WireValue};
use xenapi_transport::{Transport, WireRequest};

/// Namespace that asks the server to run a method as a task.
pub const ASYNC_PREFIX: &str = "Async";

/// A decoded result plus the soft faults raised while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub value: T,
    /// Unknown enumerants that were replaced by `Undefined`.
    pub soft_faults: Vec<Fault>,
}

impl<T> Reply<T> {
    pub fn is_clean(&self) -> bool {
        self.soft_faults.is_empty()
    }

    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U, Fault>) -> Result<Reply<U>, Fault> {
        Ok(Reply {
            value: f(self.value)?,
            soft_faults: self.soft_faults,
        })
    }
}

pub fn async_method(method: &str) -> String {
    format!("{}.{}", ASYNC_PREFIX, method)
}

/// Wire parameters for a call, prefixed by the session token when there is one.
pub fn encode_params(session: Option<&str>, params: &[TypedValue]) -> Result<Vec<WireValue>, Fault> {
    let mut wire = Vec::with_capacity(params.len() + 1);
    if let Some(token) = session {
        wire.push(WireValue::from(token));
    }
    for param in params {
        wire.push(param.encode()?);
    }
    Ok(wire)
}

/// Send one request and return the payload of a success envelope.
pub async fn invoke<T: Transport + ?Sized>(
    transport: &T,
    method: &str,
    params: Vec<WireValue>,
) -> Result<WireValue, Fault> {
    debug!(method, params = params.len(), "dispatching call");

    let response = transport
        .send_and_receive(WireRequest::new(method, params))
        .await
        .map_err(|e| {
            warn!(method, error = %e, "transport failure");
            Fault::from(e)
        })?;

    Envelope::from_wire(response)?.into_result().map_err(|fault| {
        debug!(method, %fault, "remote failure");
        fault
    })
}

/// Decode a success payload against `descriptor`.
pub fn decode_reply(method: &str, payload: &WireValue, descriptor: &TypeDescriptor) -> Result<Reply<Value>, Fault> {
    let mut ctx = DecodeContext::new();
    let value = descriptor.decode(payload, &mut ctx).map_err(|fault| {
        warn!(method, expected = %descriptor, %fault, "response does not match the expected type");
        fault
    })?;

    let soft_faults = ctx.into_soft_faults();
    if !soft_faults.is_empty() {
        warn!(method, count = soft_faults.len(), "response decoded with soft faults");
    }
    Ok(Reply { value, soft_faults })
}
