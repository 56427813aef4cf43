//! Tool registry error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::mcp::McpError;

/// Errors that can occur while registering, materializing or invoking tools
///
/// Missing credentials are deliberately absent from this list: a tool whose
/// key is not configured is reported as disabled and yields an empty list.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Lookup of a name that has no provider, spec or built-in entry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A different spec is already registered under this name
    #[error("Tool '{0}' is already registered with a different spec")]
    DuplicateTool(String),

    /// An async-only builder was invoked from the synchronous path
    #[error("Tool '{0}' has an async builder; use get_tools_async")]
    AsyncBuilderMisuse(String),

    /// Spec cannot be turned into a provider (bad URL, empty command, ...)
    #[error("Invalid spec for '{name}': {message}")]
    InvalidSpec { name: String, message: String },

    /// Synchronous lookup attempted from inside an async runtime
    #[error("Cannot materialize '{0}' synchronously inside an async runtime; use get_tools_async")]
    BlockingInRuntime(String),

    /// MCP transport failure (spawn, handshake, list_tools)
    #[error("Transport error for '{name}': {source}")]
    Transport {
        name: String,
        #[source]
        source: McpError,
    },

    /// A tool invocation failed
    #[error("Tool '{tool}' failed: {message}")]
    Invocation { tool: String, message: String },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error (e.g. building the blocking runtime)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Create an invalid spec error
    pub fn invalid_spec(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(name: impl Into<String>, source: McpError) -> Self {
        Self::Transport {
            name: name.into(),
            source,
        }
    }

    /// Create an invocation error
    pub fn invocation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
