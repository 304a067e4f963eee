//! MCP protocol handling: JSON-RPC dispatch and session lifecycle.

pub mod handler;
pub mod methods;
pub mod negotiation;

pub use handler::ProtocolHandler;
pub use methods::{MethodContext, MethodHandler};
pub use negotiation::NegotiatedSession;
