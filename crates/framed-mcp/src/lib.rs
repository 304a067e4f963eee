//! Framed MCP server: a JSON-RPC 2.0 protocol engine behind a
//! Content-Length framed stdio transport.

pub mod config;
pub mod protocol;
pub mod repl;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use protocol::ProtocolHandler;
pub use tools::ToolRegistry;
pub use transport::{SessionEnd, StdioTransport};
