//! Toolbelt Core
//!
//! Declare tools once, use them uniformly. A tool list may come from a local
//! MCP server spawned over stdio, a hosted MCP server (DashScope or any SSE /
//! streamable-HTTP endpoint) or a plain Rust builder function.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toolbelt_core::tools::{builtin::weather, ToolBuilder, ToolContext};
//! use toolbelt_core::types::FunctionTool;
//!
//! let ctx = ToolContext::from_env()?;
//!
//! // Built-in tools register themselves on first use
//! let tools = weather::get_weather_tools_async(&ctx, false).await?;
//!
//! // Local tools
//! ctx.register_callable_tool(
//!     "echo",
//!     ToolBuilder::sync(|| Ok(vec![FunctionTool::sync("echo", "Echo", Ok).shared()])),
//!     "Echo tools",
//!     ["local"],
//! )?;
//! let echo = ctx.get_tools_async("echo", false).await?;
//!
//! // Execute tool calls from an LLM response
//! let output = echo.execute(&tool_call).await;
//! ```

pub mod error;
pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod mcp;
pub mod tools;

pub use error::{ToolError, ToolResult};

pub use types::{FunctionTool, SharedTool, Tool, ToolCall, ToolDefinition, ToolOutput, ToolSet};

pub use secrets::{ChainSecretStore, EnvSecretStore, MemorySecretStore, SecretInfo, SecretStore};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{ConfigError, FileSpecSource, MemorySpecSource, Settings, SpecSource};

pub use mcp::{McpClient, McpConnector, McpError, McpResult, RmcpConnector};

pub use tools::{
    CallableOptions, DisabledReason, McpTransportKind, ProviderStatus, ToolBuilder, ToolContext,
    ToolSpec,
};
