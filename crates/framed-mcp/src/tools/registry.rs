//! Tool registration and dispatch.

use serde_json::{Map, Value};

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::echo;

/// Invocation entry point of a tool: receives the `arguments` object.
pub type ToolFn = fn(&Map<String, Value>) -> McpResult<ToolCallResult>;

struct RegisteredTool {
    definition: ToolDefinition,
    execute: ToolFn,
}

/// Named, schema-described tools in registration order.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(echo::definition(), echo::execute);
        registry
    }

    /// Add a tool, replacing any earlier tool with the same name.
    pub fn register(&mut self, definition: ToolDefinition, execute: ToolFn) {
        let entry = RegisteredTool {
            definition,
            execute,
        };
        match self
            .tools
            .iter_mut()
            .find(|tool| tool.definition.name == entry.definition.name)
        {
            Some(existing) => {
                tracing::warn!("Replacing tool {}", entry.definition.name);
                *existing = entry;
            }
            None => self.tools.push(entry),
        }
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.find(name).map(|tool| &tool.definition)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name. Absent `arguments` count as an empty object.
    pub fn call(&self, name: &str, arguments: Option<Value>) -> McpResult<ToolCallResult> {
        let tool = self
            .find(name)
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;

        let args = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(args)) => args,
            Some(other) => {
                return Err(McpError::InternalError(format!(
                    "tool arguments must be an object, got {other}"
                )))
            }
        };

        (tool.execute)(&args)
    }

    fn find(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|tool| tool.definition.name == name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtin_tools()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InputSchema;
    use serde_json::json;

    fn shout(args: &Map<String, Value>) -> McpResult<ToolCallResult> {
        let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(ToolCallResult::text(text.to_uppercase()))
    }

    fn shout_definition(description: &str) -> ToolDefinition {
        ToolDefinition {
            name: "shout".to_string(),
            description: description.to_string(),
            input_schema: InputSchema::object().property("text", "string", "Text to shout."),
        }
    }

    #[test]
    fn test_builtin_catalog() {
        let registry = ToolRegistry::with_builtin_tools();
        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["echo".to_string()]);
        assert!(registry.get("echo").is_some());
    }

    #[test]
    fn test_unknown_tool_is_lookup_miss() {
        let registry = ToolRegistry::with_builtin_tools();
        let err = registry.call("nope", None).unwrap_err();
        assert!(matches!(err, McpError::ToolNotFound(ref name) if name == "nope"));
        assert_eq!(err.code(), -32603);
    }

    #[test]
    fn test_missing_arguments_are_empty() {
        let registry = ToolRegistry::with_builtin_tools();
        let result = registry.call("echo", None).unwrap();
        assert_eq!(result, ToolCallResult::text(String::new()));
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let registry = ToolRegistry::with_builtin_tools();
        let err = registry.call("echo", Some(json!(["hi"]))).unwrap_err();
        assert_eq!(err.code(), -32603);
    }

    #[test]
    fn test_register_adds_and_replaces() {
        let mut registry = ToolRegistry::with_builtin_tools();
        registry.register(shout_definition("first"), shout);
        registry.register(shout_definition("second"), shout);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("shout").unwrap().description, "second");

        let result = registry.call("shout", Some(json!({"text": "hey"}))).unwrap();
        assert_eq!(result, ToolCallResult::text("HEY".to_string()));
    }
}
