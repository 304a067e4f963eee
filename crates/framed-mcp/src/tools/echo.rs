//! Tool: echo. Returns the caller's text unchanged.

use serde_json::{Map, Value};

use crate::types::{InputSchema, McpError, McpResult, ToolCallResult, ToolDefinition};

pub const NAME: &str = "echo";

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.to_string(),
        description: "Return the same text that the caller provides.".to_string(),
        input_schema: InputSchema::object()
            .property("text", "string", "Text to echo back to the caller.")
            .required("text"),
    }
}

/// A missing or null `text` echoes the empty string.
pub fn execute(args: &Map<String, Value>) -> McpResult<ToolCallResult> {
    let text = match args.get("text") {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(other) => {
            return Err(McpError::InternalError(format!(
                "argument `text` must be a string, got {other}"
            )))
        }
    };

    Ok(ToolCallResult::text(text.to_string()))
}
