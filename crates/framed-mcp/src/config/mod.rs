//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit command-line value, then environment
//! variable, then built-in default.

use mcp_frame::DEFAULT_MAX_FRAME_LEN;

use crate::types::{Implementation, McpError, McpResult};

/// Environment variable overriding the maximum frame body size in bytes.
pub const MAX_FRAME_BYTES_ENV: &str = "FRAMED_MCP_MAX_FRAME_BYTES";

/// Environment variable holding the default log filter.
pub const LOG_ENV: &str = "FRAMED_MCP_LOG";

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_info: Implementation,
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_info: Implementation::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ServerConfig {
    /// Resolve from an explicit value and the process environment.
    pub fn resolve(max_frame_bytes: Option<usize>) -> McpResult<Self> {
        Self::resolve_with(max_frame_bytes, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        max_frame_bytes: Option<usize>,
        env: impl Fn(&str) -> Option<String>,
    ) -> McpResult<Self> {
        let max_frame_len = match max_frame_bytes {
            Some(bytes) => bytes,
            None => match env(MAX_FRAME_BYTES_ENV) {
                Some(value) => value.trim().parse::<usize>().map_err(|_| {
                    McpError::Config(format!(
                        "{MAX_FRAME_BYTES_ENV} must be a non-negative integer, got {value:?}"
                    ))
                })?,
                None => DEFAULT_MAX_FRAME_LEN,
            },
        };

        Ok(Self {
            max_frame_len,
            ..Self::default()
        })
    }
}

/// Resolve the log filter directive used when `RUST_LOG` is unset.
pub fn resolve_log_filter(explicit: Option<&str>) -> String {
    resolve_log_filter_with(explicit, |key| std::env::var(key).ok())
}

fn resolve_log_filter_with(explicit: Option<&str>, env: impl Fn(&str) -> Option<String>) -> String {
    if let Some(level) = explicit {
        return level.to_string();
    }

    env(LOG_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}
