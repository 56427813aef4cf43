//! Tool served by a remote MCP session

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{CallToolResult, RawContent, Tool as McpTool};
use serde_json::Value;

use super::client::McpClient;
use crate::error::{ToolError, ToolResult};
use crate::types::Tool;

/// One tool of a connected MCP server
pub struct McpRemoteTool {
    client: Arc<McpClient>,
    name: String,
    description: String,
    input_schema: Value,
}

impl McpRemoteTool {
    pub fn new(client: Arc<McpClient>, tool: McpTool) -> Self {
        Self {
            client,
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            input_schema: Value::Object((*tool.input_schema).clone()),
        }
    }

    pub fn server_name(&self) -> &str {
        self.client.server_name()
    }
}

impl std::fmt::Debug for McpRemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRemoteTool")
            .field("server", &self.client.server_name())
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl Tool for McpRemoteTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn invoke(&self, args: Value) -> ToolResult<Value> {
        let result = self
            .client
            .call_tool(&self.name, args)
            .await
            .map_err(|e| ToolError::invocation(&self.name, e.to_string()))?;

        if result.is_error.unwrap_or(false) {
            return Err(ToolError::invocation(&self.name, result_text(&result)));
        }
        Ok(Value::String(result_text(&result)))
    }
}

/// Text parts of a call result joined by newlines
fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
