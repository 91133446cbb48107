//! # Types Module
//!
//! Core data types shared across the dispatch runtime: normalized tool
//! calls, tool definitions/results, and the wire shapes model responses
//! arrive in.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ToolCall`] | Normalized function/tool invocation from a model response |
//! | [`ToolDefinition`] | Tool definition advertised to the model |
//! | [`ToolResult`] | Execution result fed back as a tool-role message |
//! | [`ModelMessage`] | One assistant message as received from a runtime |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tool`] | Tool/function calling types |
//! | [`response`] | Wire shapes of provider responses |

pub mod response;
pub mod tool;

pub use response::{ModelMessage, RawFunctionCall, RawToolCall};
pub use tool::{FunctionDefinition, ToolCall, ToolDefinition, ToolResult};
