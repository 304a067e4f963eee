//! Conversion between frame payloads and JSON-RPC values.
//!
//! The byte-level framing lives in `mcp_frame`; this module only knows how a
//! payload maps to JSON.

use serde_json::Value;

use crate::types::{JsonRpcReply, McpError, McpResult};

/// Parse a frame payload as a JSON document.
pub fn parse_payload(payload: &[u8]) -> McpResult<Value> {
    serde_json::from_slice(payload).map_err(|e| McpError::ParseError(e.to_string()))
}

/// Serialize a reply into a frame payload.
pub fn encode_reply(reply: &JsonRpcReply) -> McpResult<Vec<u8>> {
    serde_json::to_vec(reply).map_err(McpError::Json)
}
