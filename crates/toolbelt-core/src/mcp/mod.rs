//! MCP (Model Context Protocol) client module
//!
//! Uses the rmcp SDK to connect to MCP servers over stdio, SSE or streamable
//! HTTP, and wraps each advertised tool as a [`Tool`](crate::types::Tool).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolbelt_core::logging::NoOpLogger;
//! use toolbelt_core::mcp::{McpConnector, McpServerConfig, McpServerTransport, RmcpConnector};
//!
//! let connector = RmcpConnector::new(Arc::new(NoOpLogger::new()));
//! let tools = connector
//!     .connect(&McpServerConfig {
//!         name: "weather".into(),
//!         transport: McpServerTransport::Sse {
//!             url: "https://dashscope.aliyuncs.com/api/v1/mcps/weather/sse".into(),
//!             headers: Default::default(),
//!         },
//!     })
//!     .await?;
//! ```

mod client;
mod connector;
mod remote_tool;

pub use client::{McpClient, McpError, McpResult};
pub use connector::{McpConnector, McpServerConfig, McpServerTransport, RmcpConnector, SharedConnector};
pub use remote_tool::McpRemoteTool;
