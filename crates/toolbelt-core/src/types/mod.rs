//! Core tool types
//!
//! Shared by providers, the manager and the MCP client.

mod tool;

pub use tool::{FunctionTool, SharedTool, Tool, ToolCall, ToolDefinition, ToolOutput, ToolSet};
