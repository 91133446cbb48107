//! # Tool Registry
//!
//! Explicit, statically-populated registry of the tools a model may invoke,
//! plus the dispatch step that runs a normalized [`ToolCall`] against its
//! handler. Registration happens in code at construction time; there is no
//! runtime discovery and no global registry instance, callers own theirs and
//! pass it by reference.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{ToolCall, ToolDefinition, ToolResult};
use crate::{Error, ErrorContext, Result};

/// One invocable tool.
///
/// Implementations are expected to be cheap to call through and to report
/// their own failures as errors; the registry turns a handler error into an
/// `is_error` [`ToolResult`] so tool failures flow back to the model as data
/// rather than unwinding the chat loop.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Definition advertised to the model (name, description, schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with an already-normalized argument object.
    async fn invoke(&self, arguments: &Map<String, Value>) -> Result<Value>;
}

/// Registry mapping tool names to handlers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the name from its definition.
    ///
    /// Registering two handlers under one name is a configuration error;
    /// tool sets are assembled once at startup, so a collision is a bug in
    /// the assembly, not something to silently overwrite.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let name = handler.definition().function.name;
        if self.tools.contains_key(&name) {
            return Err(Error::configuration_with_context(
                format!("tool '{}' is already registered", name),
                ErrorContext::new().with_tool(name).with_source("registry"),
            ));
        }
        tracing::debug!(tool = %name, "registered tool handler");
        self.tools.insert(name, handler);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every registered tool, for the model's tool list.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|h| h.definition()).collect()
    }

    /// Execute a normalized tool call.
    ///
    /// An unknown tool name is an error (the model asked for something we
    /// never advertised). A handler failure is not: it becomes an
    /// `is_error` result so the caller can feed it back to the model.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ToolResult> {
        let handler = self
            .tools
            .get(&call.name)
            .ok_or_else(|| Error::tool_execution(call.name.clone(), "tool is not registered"))?;
        tracing::debug!(tool = %call.name, "dispatching tool call");
        match handler.invoke(&call.arguments).await {
            Ok(content) => Ok(ToolResult::ok(call.name.clone(), content)),
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "tool handler failed");
                Ok(ToolResult::error(call.name.clone(), err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ListTables;

    #[async_trait]
    impl ToolHandler for ListTables {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::function("list_tables", "List database tables", None)
        }

        async fn invoke(&self, _arguments: &Map<String, Value>) -> Result<Value> {
            Ok(json!(["customers", "orders"]))
        }
    }

    struct QueryData;

    #[async_trait]
    impl ToolHandler for QueryData {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::function(
                "query_data",
                "Run a read-only SQL query",
                Some(json!({
                    "type": "object",
                    "properties": {"sql": {"type": "string"}},
                    "required": ["sql"]
                })),
            )
        }

        async fn invoke(&self, arguments: &Map<String, Value>) -> Result<Value> {
            match arguments.get("sql").and_then(Value::as_str) {
                Some(sql) if sql.to_lowercase().starts_with("select") => {
                    Ok(json!({"rows": [], "sql": sql}))
                }
                Some(_) => Err(Error::tool_execution(
                    "query_data",
                    "only SELECT statements are allowed",
                )),
                None => Err(Error::tool_execution("query_data", "missing sql argument")),
            }
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ListTables)).unwrap();
        registry.register(Arc::new(QueryData)).unwrap();
        registry
    }

    #[test]
    fn duplicate_registration_is_a_configuration_error() {
        let mut registry = registry();
        let err = registry.register(Arc::new(ListTables)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn definitions_cover_all_tools() {
        let registry = registry();
        let mut names: Vec<_> = registry
            .definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["list_tables", "query_data"]);
    }

    #[tokio::test]
    async fn dispatch_runs_handler() {
        let registry = registry();
        let result = registry
            .dispatch(&ToolCall::nullary("list_tables"))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.content, json!(["customers", "orders"]));
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_fails() {
        let registry = registry();
        let err = registry
            .dispatch(&ToolCall::nullary("drop_tables"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolExecution { .. }));
    }

    #[tokio::test]
    async fn handler_failure_becomes_error_result() {
        let registry = registry();
        let mut arguments = Map::new();
        arguments.insert("sql".to_string(), json!("DROP TABLE customers"));
        let result = registry
            .dispatch(&ToolCall::new("query_data", arguments))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.render().contains("only SELECT statements"));
    }
}
