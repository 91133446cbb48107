//! # Tool-Call Normalizer
//!
//! LLM runtimes emit tool-call intent in incompatible shapes: some attach a
//! typed `tool_calls` list to the message, others embed a freeform
//! `<toolcall>{...}</toolcall>` block inside the text content. This module is
//! the single seam that isolates that variability from dispatch logic: both
//! shapes normalize into the same [`ToolCall`] carrying a name and a JSON
//! object of arguments.
//!
//! Parse failures are reported as [`ParseOutcome::Malformed`] data, never as
//! a raised error, so callers decide whether to retry, skip, or surface them.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::types::{ModelMessage, RawToolCall, ToolCall};

const TOOLCALL_OPEN: &str = "<toolcall>";
const TOOLCALL_CLOSE: &str = "</toolcall>";

/// Outcome of normalizing one model message (or one structured entry).
///
/// Expressed as an enum so the "never both a tool name and an error"
/// invariant holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The message requests a tool invocation.
    Call(ToolCall),
    /// Plain text response; no tool call and no error.
    Text,
    /// The message looked like a tool call but could not be normalized.
    /// `tool_name` is populated when the name was readable before the
    /// failure (e.g. a structured entry whose arguments failed to decode),
    /// so callers can still attribute the error.
    Malformed {
        tool_name: Option<String>,
        reason: String,
    },
}

impl ParseOutcome {
    pub fn is_call(&self) -> bool {
        matches!(self, ParseOutcome::Call(_))
    }

    pub fn into_call(self) -> Option<ToolCall> {
        match self {
            ParseOutcome::Call(call) => Some(call),
            _ => None,
        }
    }

    fn malformed(tool_name: Option<String>, reason: impl Into<String>) -> Self {
        ParseOutcome::Malformed {
            tool_name,
            reason: reason.into(),
        }
    }
}

/// Disambiguation rules for the tag-based format.
///
/// The tagged JSON body carries no explicit tool name; the tool is inferred
/// from which fields its `arguments` object contains. That inference is a
/// workaround for an under-specified upstream format, not a stable contract,
/// so the rules are injected here rather than hard-coded in the parser.
#[derive(Debug, Clone)]
pub struct TagHeuristics {
    /// Tools identified by `{"name": "<tool>"}` and invoked with no
    /// arguments.
    pub zero_arg_tools: HashSet<String>,
    /// Tool selected when the arguments object carries an `sql` field; it
    /// receives the whole object as its arguments.
    pub sql_tool: String,
}

impl Default for TagHeuristics {
    fn default() -> Self {
        Self {
            zero_arg_tools: ["list_tables", "get_database_schema"]
                .into_iter()
                .map(String::from)
                .collect(),
            sql_tool: "query_data".to_string(),
        }
    }
}

/// Shape of the JSON body inside a `<toolcall>` block.
#[derive(Debug, Deserialize)]
struct TaggedBody {
    #[serde(rename = "type")]
    kind: String,
    arguments: Value,
}

/// Normalizes model responses into canonical tool calls.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    heuristics: TagHeuristics,
}

impl Normalizer {
    pub fn new(heuristics: TagHeuristics) -> Self {
        Self { heuristics }
    }

    /// Normalize one message.
    ///
    /// Structured `tool_calls` entries take precedence over tagged content;
    /// only the first entry is examined here (use [`Self::parse_all`] for
    /// multi-call responses). A message with neither shape is plain text.
    pub fn parse(&self, message: &ModelMessage) -> ParseOutcome {
        if let Some(entry) = message.tool_calls.first() {
            tracing::debug!("normalizing structured tool_calls entry");
            return self.parse_structured(entry);
        }
        if let Some(content) = message.content.as_deref() {
            if content.contains(TOOLCALL_OPEN) {
                tracing::debug!("normalizing <toolcall> block in content");
                return self.parse_tagged(content);
            }
        }
        ParseOutcome::Text
    }

    /// Normalize every structured entry of a message, one outcome per entry.
    ///
    /// Falls back to the single-shot path (tagged content or plain text)
    /// when the message carries no structured entries.
    pub fn parse_all(&self, message: &ModelMessage) -> Vec<ParseOutcome> {
        if message.tool_calls.is_empty() {
            return vec![self.parse(message)];
        }
        message
            .tool_calls
            .iter()
            .map(|entry| self.parse_structured(entry))
            .collect()
    }

    /// Normalize one structured tool-call entry.
    ///
    /// The `arguments` value is either an object (used as-is) or a string
    /// that itself encodes a JSON object. Decode failures keep the tool name
    /// so callers can attribute the error.
    pub fn parse_structured(&self, entry: &RawToolCall) -> ParseOutcome {
        let name = entry.function.name.clone();
        match &entry.function.arguments {
            Value::Object(map) => ParseOutcome::Call(ToolCall::new(name, map.clone())),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => ParseOutcome::Call(ToolCall::new(name, map)),
                Ok(other) => ParseOutcome::malformed(
                    Some(name),
                    format!("arguments decoded to non-object JSON: {}", other),
                ),
                Err(_) => ParseOutcome::malformed(
                    Some(name),
                    format!("failed to parse arguments: {}", raw),
                ),
            },
            // Treat an absent arguments field as an empty object; some
            // runtimes omit it entirely for zero-argument tools.
            Value::Null => ParseOutcome::Call(ToolCall::nullary(name)),
            other => ParseOutcome::malformed(
                Some(name),
                format!("unexpected argument type: {}", type_name(other)),
            ),
        }
    }

    /// Normalize a `<toolcall>...</toolcall>` block embedded in content.
    fn parse_tagged(&self, content: &str) -> ParseOutcome {
        let Some(start) = content.find(TOOLCALL_OPEN) else {
            return ParseOutcome::Text;
        };
        let body_start = start + TOOLCALL_OPEN.len();
        let Some(end) = content[body_start..].find(TOOLCALL_CLOSE) else {
            return ParseOutcome::malformed(None, "missing </toolcall> end marker");
        };
        let body = content[body_start..body_start + end].trim();

        let parsed: TaggedBody = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(_) => {
                return ParseOutcome::malformed(
                    None,
                    format!("failed to parse JSON in toolcall tag: {}", body),
                )
            }
        };
        if parsed.kind != "function" {
            return ParseOutcome::malformed(None, "unexpected JSON structure in <toolcall>");
        }
        let Value::Object(arguments) = parsed.arguments else {
            return ParseOutcome::malformed(
                None,
                "arguments field in <toolcall> JSON is not an object",
            );
        };

        // The body carries no explicit tool name; infer it from the
        // arguments shape (see TagHeuristics).
        if let Some(Value::String(candidate)) = arguments.get("name") {
            if self.heuristics.zero_arg_tools.contains(candidate) {
                return ParseOutcome::Call(ToolCall::nullary(candidate.clone()));
            }
        }
        if arguments.contains_key("sql") {
            return ParseOutcome::Call(ToolCall::new(self.heuristics.sql_tool.clone(), arguments));
        }
        ParseOutcome::malformed(
            None,
            format!(
                "unrecognized arguments structure in <toolcall>: {}",
                Value::Object(arguments)
            ),
        )
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
