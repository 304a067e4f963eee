//! Request handlers, one per JSON-RPC method.

use serde_json::{json, Map, Value};

use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::NegotiatedSession;

/// What a method handler may touch while serving one request.
pub struct MethodContext<'a> {
    pub session: &'a mut NegotiatedSession,
    pub tools: &'a ToolRegistry,
}

/// A JSON-RPC method: request params in, result or error out.
pub trait MethodHandler {
    /// Whether the method is refused until the session is initialized.
    fn requires_initialization(&self) -> bool {
        true
    }

    fn call(&self, ctx: &mut MethodContext<'_>, params: Option<Value>) -> McpResult<Value>;
}

pub struct Initialize {
    server_info: Implementation,
}

impl Initialize {
    pub fn new(server_info: Implementation) -> Self {
        Self { server_info }
    }
}

impl MethodHandler for Initialize {
    fn requires_initialization(&self) -> bool {
        false
    }

    fn call(&self, ctx: &mut MethodContext<'_>, params: Option<Value>) -> McpResult<Value> {
        let params = match params {
            Some(params) => serde_json::from_value(params).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed initialize params: {e}");
                InitializeParams::default()
            }),
            None => InitializeParams::default(),
        };

        let result = ctx.session.negotiate(params, &self.server_info);
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

pub struct Ping;

impl MethodHandler for Ping {
    fn call(&self, _ctx: &mut MethodContext<'_>, _params: Option<Value>) -> McpResult<Value> {
        Ok(json!({ "result": "pong" }))
    }
}

pub struct ToolsList;

impl MethodHandler for ToolsList {
    fn call(&self, ctx: &mut MethodContext<'_>, _params: Option<Value>) -> McpResult<Value> {
        let result = ToolListResult {
            tools: ctx.tools.list_tools(),
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

pub struct ToolsCall;

impl MethodHandler for ToolsCall {
    fn call(&self, ctx: &mut MethodContext<'_>, params: Option<Value>) -> McpResult<Value> {
        let params = match params {
            None | Some(Value::Null) => {
                return Err(McpError::InvalidRequest(
                    "Missing params for tools/call".to_string(),
                ))
            }
            Some(params) => params,
        };

        let call_params: ToolCallParams = serde_json::from_value(params)
            .map_err(|e| McpError::InternalError(e.to_string()))?;

        tracing::debug!("Calling tool {}", call_params.name);
        let result = ctx.tools.call(&call_params.name, call_params.arguments)?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

pub struct Shutdown;

impl MethodHandler for Shutdown {
    fn call(&self, _ctx: &mut MethodContext<'_>, _params: Option<Value>) -> McpResult<Value> {
        tracing::info!("Shutdown requested");
        Ok(Value::Object(Map::new()))
    }
}
