//! Request dispatcher. Classifies inbound messages and routes requests to method handlers.

use std::collections::HashMap;

use serde_json::Value;

use crate::tools::ToolRegistry;
use crate::transport::framing;
use crate::types::*;

use super::methods::{self, MethodContext, MethodHandler};
use super::negotiation::NegotiatedSession;

/// The protocol engine for one session.
///
/// Owns the session state, the tool catalog, and the method table. Every
/// inbound payload yields at most one reply.
pub struct ProtocolHandler {
    methods: HashMap<String, Box<dyn MethodHandler>>,
    session: NegotiatedSession,
    tools: ToolRegistry,
}

impl ProtocolHandler {
    pub fn new(tools: ToolRegistry) -> Self {
        Self::with_server_info(tools, Implementation::default())
    }

    pub fn with_server_info(tools: ToolRegistry, server_info: Implementation) -> Self {
        let mut handler = Self {
            methods: HashMap::new(),
            session: NegotiatedSession::new(),
            tools,
        };

        handler.register_method("initialize", methods::Initialize::new(server_info));
        handler.register_method("ping", methods::Ping);
        handler.register_method("tools/list", methods::ToolsList);
        handler.register_method("tools/call", methods::ToolsCall);
        handler.register_method("shutdown", methods::Shutdown);
        handler
    }

    /// Add or replace the handler for a method name.
    pub fn register_method(
        &mut self,
        method: impl Into<String>,
        handler: impl MethodHandler + 'static,
    ) {
        self.methods.insert(method.into(), Box::new(handler));
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_initialized()
    }

    pub fn session(&self) -> &NegotiatedSession {
        &self.session
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one raw frame payload.
    ///
    /// A payload that is not valid JSON is answered with a parse error
    /// carrying `id: null`.
    pub fn handle_payload(&mut self, payload: &[u8]) -> Option<JsonRpcReply> {
        match framing::parse_payload(payload) {
            Ok(value) => self.handle_value(value),
            Err(e) => {
                tracing::warn!("Failed to parse payload: {e}");
                Some(e.to_json_rpc_error(RequestId::Null).into())
            }
        }
    }

    pub fn handle_value(&mut self, value: Value) -> Option<JsonRpcReply> {
        match JsonRpcMessage::classify(value) {
            Ok(msg) => self.handle_message(msg),
            Err(Rejection::Dropped(reason)) => {
                tracing::warn!("Dropping message: {reason}");
                None
            }
            Err(Rejection::Answered { id, error }) => {
                tracing::warn!("Rejecting request {id}: {error}");
                Some(error.to_json_rpc_error(id).into())
            }
        }
    }

    pub fn handle_message(&mut self, msg: JsonRpcMessage) -> Option<JsonRpcReply> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req)),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(&notif);
                None
            }
            JsonRpcMessage::Response(id) => {
                tracing::debug!("Ignoring response from client (id {id:?})");
                None
            }
        }
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcReply {
        let id = request.id.clone();
        let method = request.method.clone();

        let reply: JsonRpcReply = match self.dispatch_request(request) {
            Ok(value) => JsonRpcResponse::new(id, value).into(),
            Err(e) => {
                tracing::debug!("Request {method} failed: {e}");
                e.to_json_rpc_error(id).into()
            }
        };

        tracing::info!(
            method = %method,
            outcome = if reply.is_error() { "failure" } else { "success" },
            "request handled"
        );
        reply
    }

    fn dispatch_request(&mut self, request: JsonRpcRequest) -> McpResult<Value> {
        let handler = self.methods.get(request.method.as_str());

        let gated = handler.map_or(true, |h| h.requires_initialization());
        if gated && !self.session.is_initialized() {
            return Err(McpError::InvalidRequest(
                "Server has not been initialized".to_string(),
            ));
        }

        let handler = handler.ok_or_else(|| McpError::MethodNotFound(request.method.clone()))?;
        let mut ctx = MethodContext {
            session: &mut self.session,
            tools: &self.tools,
        };
        handler.call(&mut ctx, request.params)
    }

    fn handle_notification(&self, notification: &JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => {
                tracing::info!("Client signalled that initialization is complete");
            }
            "notifications/cancelled" => {
                tracing::info!("Received cancellation notification; requests always run to completion");
            }
            _ => {
                tracing::debug!("Ignoring notification: {}", notification.method);
            }
        }
    }
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new(ToolRegistry::with_builtin_tools())
    }
}
