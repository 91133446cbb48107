//! Wire shapes for model responses as the normalizer receives them.
//!
//! These records mirror what LLM runtimes actually emit: a message with
//! optional text content and an optional list of structured tool-call
//! entries. Provider JSON deserializes straight onto them; fields the
//! normalizer does not consume are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One assistant message from a model response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelMessage {
    /// Free-form text content. May embed a `<toolcall>...</toolcall>` block
    /// when the runtime does not support structured tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Structured tool-call entries, when the runtime emits them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<RawToolCall>,
}

impl ModelMessage {
    /// A plain-text message with no structured tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A message carrying structured tool-call entries.
    pub fn with_tool_calls(tool_calls: Vec<RawToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }
}

/// A structured tool-call entry exactly as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawToolCall {
    pub function: RawFunctionCall,
}

/// Function descriptor inside a structured tool-call entry.
///
/// `arguments` is kept as a raw [`Value`] because runtimes disagree on its
/// shape: some emit a JSON object, others a string that itself encodes JSON.
/// The normalizer owns that disambiguation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RawToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            function: RawFunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}
