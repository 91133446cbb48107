//! Tool calling definitions shared by the normalizer and the registry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool definition (for function calling), advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    /// Convenience constructor for the common `"function"` tool type.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Option<Value>,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Option<Value>, // JSON Schema
}

/// A normalized tool invocation extracted from a model response.
///
/// `arguments` is always a JSON object; responses that carry arguments as a
/// string-encoded JSON payload are decoded before a `ToolCall` is built.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// A call with no arguments (e.g. `list_tables`).
    pub fn nullary(name: impl Into<String>) -> Self {
        Self::new(name, Map::new())
    }
}

/// Result of executing a tool, fed back to the model as a tool-role message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub content: Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(tool_name: impl Into<String>, content: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            content,
            is_error: false,
        }
    }

    pub fn error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            content: Value::String(message.into()),
            is_error: true,
        }
    }

    /// Render the result as the text a chat loop feeds back to the model.
    pub fn render(&self) -> String {
        let content = match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("Tool execution result for {}: {}", self.tool_name, content)
    }
}
