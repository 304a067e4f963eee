//! JSON-RPC 2.0 message types and structural classification.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::McpError;

/// JSON-RPC 2.0 protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier. Any JSON scalar, echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
}

impl RequestId {
    /// Convert a raw `id` member. Objects and arrays are not valid ids.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s)),
            Value::Number(n) => Some(RequestId::Number(n)),
            Value::Bool(b) => Some(RequestId::Bool(b)),
            Value::Null => Some(RequestId::Null),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{s}"),
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Bool(b) => write!(f, "{b}"),
            RequestId::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: RequestId,
    pub error: JsonRpcErrorObject,
}

/// Error object within a JSON-RPC error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// What the server sends back for a single request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    Result(JsonRpcResponse),
    Error(JsonRpcError),
}

impl JsonRpcReply {
    pub fn id(&self) -> &RequestId {
        match self {
            JsonRpcReply::Result(response) => &response.id,
            JsonRpcReply::Error(error) => &error.id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcReply::Error(_))
    }
}

impl From<JsonRpcResponse> for JsonRpcReply {
    fn from(response: JsonRpcResponse) -> Self {
        JsonRpcReply::Result(response)
    }
}

impl From<JsonRpcError> for JsonRpcReply {
    fn from(error: JsonRpcError) -> Self {
        JsonRpcReply::Error(error)
    }
}

/// An inbound message, classified by which members it carries.
#[derive(Debug, Clone)]
pub enum JsonRpcMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// A response to a server-initiated request. Carries the raw `id`, if any.
    Response(Option<Value>),
}

/// Why a decoded payload did not become a [`JsonRpcMessage`].
#[derive(Debug)]
pub enum Rejection {
    /// Not owed a response; the caller logs the reason and moves on.
    Dropped(String),
    /// A request that is identifiable enough to answer with an error.
    Answered { id: RequestId, error: McpError },
}

impl JsonRpcMessage {
    /// Classify a decoded payload.
    ///
    /// The version tag is checked first, then `method`+`id` (request),
    /// `method` alone (notification), `result`/`error` (response).
    pub fn classify(value: Value) -> Result<Self, Rejection> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(Rejection::Dropped(format!(
                    "payload is not an object: {}",
                    value_kind(&other)
                )))
            }
        };

        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => {}
            Some(other) => {
                return Err(Rejection::Dropped(format!(
                    "unsupported jsonrpc version {other}"
                )))
            }
            None => return Err(Rejection::Dropped("missing jsonrpc version".to_string())),
        }

        let Some(method) = object.remove("method") else {
            if object.contains_key("result") || object.contains_key("error") {
                return Ok(JsonRpcMessage::Response(object.remove("id")));
            }
            return Err(Rejection::Dropped(format!(
                "unrecognized message shape with members {:?}",
                object.keys().collect::<Vec<_>>()
            )));
        };
        let params = object.remove("params");

        match object.remove("id") {
            Some(id) => Self::request(id, method, params),
            None => Self::notification(method, params),
        }
    }

    fn request(id: Value, method: Value, params: Option<Value>) -> Result<Self, Rejection> {
        let id = RequestId::from_value(id).ok_or_else(|| Rejection::Answered {
            id: RequestId::Null,
            error: McpError::InvalidRequest(
                "Request id must be a string, number, boolean, or null".to_string(),
            ),
        })?;

        match method {
            Value::String(method) => Ok(JsonRpcMessage::Request(JsonRpcRequest {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id,
                method,
                params,
            })),
            other => Err(Rejection::Answered {
                id,
                error: McpError::InternalError(format!(
                    "method must be a string, got {}",
                    value_kind(&other)
                )),
            }),
        }
    }

    fn notification(method: Value, params: Option<Value>) -> Result<Self, Rejection> {
        match method {
            Value::String(method) => Ok(JsonRpcMessage::Notification(JsonRpcNotification {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method,
                params,
            })),
            other => Err(Rejection::Dropped(format!(
                "notification method must be a string, got {}",
                value_kind(&other)
            ))),
        }
    }
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

impl JsonRpcError {
    pub fn new(id: RequestId, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code,
                message,
                data: None,
            },
        }
    }
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(value: Value) -> Result<JsonRpcMessage, Rejection> {
        JsonRpcMessage::classify(value)
    }

    #[test]
    fn test_request_with_scalar_ids() {
        for id in [json!(7), json!("abc"), json!(1.5), json!(true), Value::Null] {
            let msg = classify(json!({"jsonrpc": "2.0", "id": id.clone(), "method": "ping"})).unwrap();
            match msg {
                JsonRpcMessage::Request(req) => {
                    assert_eq!(req.method, "ping");
                    assert_eq!(serde_json::to_value(&req.id).unwrap(), id);
                }
                other => panic!("expected request, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_notification_without_id() {
        let msg = classify(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).unwrap();
        assert!(matches!(msg, JsonRpcMessage::Notification(n) if n.method == "notifications/initialized"));
    }

    #[test]
    fn test_inbound_response() {
        let msg = classify(json!({"jsonrpc": "2.0", "id": 3, "result": {}})).unwrap();
        assert!(matches!(msg, JsonRpcMessage::Response(Some(_))));

        let msg = classify(json!({"jsonrpc": "2.0", "error": {"code": 1, "message": "x"}})).unwrap();
        assert!(matches!(msg, JsonRpcMessage::Response(None)));
    }

    #[test]
    fn test_version_checked_before_shape() {
        let missing = classify(json!({"id": 1, "method": "ping"})).unwrap_err();
        assert!(matches!(missing, Rejection::Dropped(_)));

        let wrong = classify(json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).unwrap_err();
        assert!(matches!(wrong, Rejection::Dropped(_)));

        let numeric = classify(json!({"jsonrpc": 2.0, "id": 1, "method": "ping"})).unwrap_err();
        assert!(matches!(numeric, Rejection::Dropped(_)));
    }

    #[test]
    fn test_non_object_payload_dropped() {
        assert!(matches!(classify(json!([1, 2])).unwrap_err(), Rejection::Dropped(_)));
        assert!(matches!(classify(json!("2.0")).unwrap_err(), Rejection::Dropped(_)));
    }

    #[test]
    fn test_unrecognized_shape_dropped() {
        let err = classify(json!({"jsonrpc": "2.0", "id": 4})).unwrap_err();
        assert!(matches!(err, Rejection::Dropped(_)));
    }

    #[test]
    fn test_non_string_method_on_request_is_answered() {
        let err = classify(json!({"jsonrpc": "2.0", "id": 9, "method": 42})).unwrap_err();
        match err {
            Rejection::Answered { id, error } => {
                assert_eq!(id, RequestId::from(9));
                assert_eq!(error.code(), -32603);
            }
            other => panic!("expected answered rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_structured_id_is_invalid_request() {
        let err = classify(json!({"jsonrpc": "2.0", "id": {"a": 1}, "method": "ping"})).unwrap_err();
        match err {
            Rejection::Answered { id, error } => {
                assert_eq!(id, RequestId::Null);
                assert_eq!(error.code(), -32600);
            }
            other => panic!("expected answered rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_reply_serialization_shapes() {
        let ok = JsonRpcReply::from(JsonRpcResponse::new(RequestId::from(1), json!({})));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": {}})
        );

        let err = JsonRpcReply::from(JsonRpcError::new(RequestId::Null, -32700, "bad".to_string()));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32700, "message": "bad"}})
        );
        assert!(err.is_error());
    }
}
