//! Connecting to an MCP server and wrapping its tools

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::client::{McpClient, McpResult};
use super::remote_tool::McpRemoteTool;
use crate::logging::SharedLogger;
use crate::types::SharedTool;

/// Where and how to reach an MCP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServerConfig {
    pub name: String,
    pub transport: McpServerTransport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpServerTransport {
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    Sse {
        url: String,
        headers: BTreeMap<String, String>,
    },
    StreamableHttp {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

impl McpServerTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpServerTransport::Stdio { .. } => "stdio",
            McpServerTransport::Sse { .. } => "sse",
            McpServerTransport::StreamableHttp { .. } => "streamable_http",
        }
    }
}

/// Opens a session with an MCP server and lists its tools
///
/// Returned tools keep their session alive; the session closes when the last
/// tool is dropped.
#[async_trait]
pub trait McpConnector: Send + Sync {
    async fn connect(&self, config: &McpServerConfig) -> McpResult<Vec<SharedTool>>;
}

pub type SharedConnector = Arc<dyn McpConnector>;

/// Connector backed by the rmcp client
pub struct RmcpConnector {
    logger: SharedLogger,
}

impl RmcpConnector {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl McpConnector for RmcpConnector {
    async fn connect(&self, config: &McpServerConfig) -> McpResult<Vec<SharedTool>> {
        let logger = self.logger.clone();
        let client = match &config.transport {
            McpServerTransport::Stdio { command, args, env } => {
                McpClient::connect_stdio(&config.name, command, args, env, logger).await?
            }
            McpServerTransport::Sse { url, headers } => {
                McpClient::connect_sse(&config.name, url, headers, logger).await?
            }
            McpServerTransport::StreamableHttp { url, headers } => {
                McpClient::connect_http(&config.name, url, headers, logger).await?
            }
        };

        let client = Arc::new(client);
        let tools = client.list_tools().await?;
        Ok(tools
            .into_iter()
            .map(|tool| Arc::new(McpRemoteTool::new(client.clone(), tool)) as SharedTool)
            .collect())
    }
}
