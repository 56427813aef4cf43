//! MCP Client using the rmcp SDK
//!
//! Connects to MCP servers over stdio (child process), SSE or streamable HTTP.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

use rmcp::{
    model::{CallToolRequestParam, CallToolResult, ClientInfo, Implementation, Tool},
    service::RunningService,
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;

use crate::logging::SharedLogger;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

/// Build HTTP client with default headers (auth and custom)
fn build_http_client(headers: &BTreeMap<String, String>) -> McpResult<reqwest::Client> {
    let mut req_headers = reqwest::header::HeaderMap::new();
    for (key, value) in headers {
        req_headers.insert(
            reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| McpError::Transport(format!("header name: {}", e)))?,
            value
                .parse()
                .map_err(|e| McpError::Transport(format!("header value: {}", e)))?,
        );
    }

    let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
    if !req_headers.is_empty() {
        builder = builder.default_headers(req_headers);
    }

    builder
        .build()
        .map_err(|e| McpError::Transport(format!("build HTTP client: {}", e)))
}

fn client_info() -> ClientInfo {
    let mut info = ClientInfo::default();
    info.client_info.name = "toolbelt".to_string();
    info.client_info.version = env!("CARGO_PKG_VERSION").to_string();
    info
}

/// Live session with one MCP server
///
/// Dropping the client ends the session (and the child process for stdio
/// servers).
pub struct McpClient {
    client: RunningService<RoleClient, ClientInfo>,
    server_name: String,
    logger: SharedLogger,
}

impl McpClient {
    /// Spawn a local MCP server and connect over its stdio
    pub async fn connect_stdio(
        server_name: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        logger: SharedLogger,
    ) -> McpResult<Self> {
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};

        logger.info(&format!(
            "[McpClient] Spawning '{}' for server '{}'",
            command, server_name
        ));

        let transport = TokioChildProcess::new(tokio::process::Command::new(command).configure(|cmd| {
            cmd.args(args)
                .envs(env.iter())
                .stderr(std::process::Stdio::inherit());
        }))
        .map_err(|e| McpError::Transport(format!("create stdio transport: {}", e)))?;

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(format!("initialize stdio client: {}", e)))?;

        Self::connected(client, server_name, logger)
    }

    /// Connect to an MCP server over SSE
    pub async fn connect_sse(
        server_name: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        logger: SharedLogger,
    ) -> McpResult<Self> {
        use rmcp::transport::{sse_client::SseClientConfig, SseClientTransport};

        logger.info(&format!("[McpClient] Connecting to SSE: {}", url));

        let http_client = build_http_client(headers)?;
        let sse_config = SseClientConfig {
            sse_endpoint: url.to_string().into(),
            ..Default::default()
        };

        let transport = SseClientTransport::start_with_client(http_client, sse_config)
            .await
            .map_err(|e| McpError::ConnectionFailed(format!("create SSE transport: {}", e)))?;

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(format!("initialize SSE client: {}", e)))?;

        Self::connected(client, server_name, logger)
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        server_name: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        logger: SharedLogger,
    ) -> McpResult<Self> {
        use rmcp::transport::{
            streamable_http_client::StreamableHttpClientTransportConfig,
            StreamableHttpClientTransport,
        };

        logger.info(&format!("[McpClient] Connecting to HTTP: {}", url));

        let http_client = build_http_client(headers)?;
        let cfg = StreamableHttpClientTransportConfig::with_uri(url);
        let transport = StreamableHttpClientTransport::with_client(http_client, cfg);

        let client = client_info().serve(transport).await.map_err(|e| {
            McpError::InitializationFailed(format!("initialize streamable client: {}", e))
        })?;

        Self::connected(client, server_name, logger)
    }

    fn connected(
        client: RunningService<RoleClient, ClientInfo>,
        server_name: &str,
        logger: SharedLogger,
    ) -> McpResult<Self> {
        logger.info(&format!(
            "[McpClient] Connected to '{}' and initialized successfully",
            server_name
        ));
        Ok(Self {
            client,
            server_name: server_name.to_string(),
            logger,
        })
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// List all available tools, following pagination
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let tools = self
            .client
            .peer()
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] Listed {} tools from '{}'",
            tools.len(),
            self.server_name
        ));

        Ok(tools)
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<CallToolResult> {
        self.logger.debug(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParam {
            name: Cow::Owned(name.to_string()),
            arguments: arguments.as_object().cloned(),
        };

        self.client
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }

    /// Close the connection
    pub async fn close(self) -> McpResult<()> {
        self.logger.info(&format!("[McpClient] Closing connection to '{}'", self.server_name));
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("server_name", &self.server_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client_with_headers() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer sk-test".to_string());
        headers.insert("X-Team".to_string(), "research".to_string());
        assert!(build_http_client(&headers).is_ok());
    }

    #[test]
    fn test_build_http_client_rejects_bad_header() {
        let mut headers = BTreeMap::new();
        headers.insert("Bad Header".to_string(), "value".to_string());
        let err = build_http_client(&headers).unwrap_err();
        assert!(matches!(err, McpError::Transport(_)));
    }

    #[test]
    fn test_client_info() {
        let info = client_info();
        assert_eq!(info.client_info.name, "toolbelt");
        assert!(!info.client_info.version.is_empty());
    }
}
