// JSON-RPC framing for the XenAPI `/jsonrpc` endpoint.
//
// Requests are JSON-RPC 2.0 objects. Responses carry either `result` or an
// `error` object whose `message` is the XenAPI error code and whose `data`
// holds the code's arguments. Both are folded back into the XenAPI response
// envelope so the dispatcher sees one format whatever the transport.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::trace;
use xenapi_core::{CallId, Envelope, WireValue};

use crate::transport::{TransportError, WireRequest};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<JsonValue>,
    id: CallId,
}

pub fn encode_request(request: &WireRequest, id: CallId) -> Result<Bytes, TransportError> {
    let frame = JsonRpcRequest {
        jsonrpc: JSONRPC_VERSION,
        method: &request.method,
        params: request.params.iter().map(WireValue::to_json).collect(),
        id,
    };
    let body = serde_json::to_vec(&frame).map_err(|e| TransportError::Codec(e.to_string()))?;
    Ok(Bytes::from(body))
}

/// Decode a response body into a XenAPI envelope.
pub fn decode_response(body: &[u8], expected_id: Option<CallId>) -> Result<WireValue, TransportError> {
    let frame: JsonValue = serde_json::from_slice(body).map_err(|e| TransportError::Codec(e.to_string()))?;
    let members = frame
        .as_object()
        .ok_or_else(|| TransportError::Protocol("response is not a JSON object".into()))?;

    if let (Some(expected), Some(id)) = (expected_id, members.get("id")) {
        if id.as_u64() != Some(expected.as_u64()) {
            return Err(TransportError::Protocol(format!(
                "response id {} does not match request {}",
                id, expected
            )));
        }
    }

    if let Some(error) = members.get("error").filter(|e| !e.is_null()) {
        trace!("JSON-RPC error object: {}", error);
        return Ok(Envelope::Failure(error_description(error)).to_wire());
    }

    match members.get("result") {
        Some(result) => Ok(Envelope::success(WireValue::from_json(result)).to_wire()),
        None => Err(TransportError::Protocol(
            "response carries neither result nor error".into(),
        )),
    }
}

fn error_description(error: &JsonValue) -> Vec<String> {
    let mut description = Vec::new();
    match error.get("message") {
        Some(JsonValue::String(code)) => description.push(code.clone()),
        Some(other) => description.push(other.to_string()),
        None => {}
    }
    match error.get("data") {
        Some(JsonValue::Array(items)) => description.extend(items.iter().map(json_text)),
        Some(JsonValue::Null) | None => {}
        Some(other) => description.push(json_text(other)),
    }
    description
}

fn json_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
