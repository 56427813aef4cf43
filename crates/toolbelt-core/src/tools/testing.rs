//! Transport-free connector for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::mcp::{McpConnector, McpError, McpResult, McpServerConfig};
use crate::types::{FunctionTool, SharedTool};

/// Counts connections and hands back echo tools with fixed names
pub struct CountingConnector {
    tool_names: Vec<String>,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicUsize,
    last_config: Mutex<Option<McpServerConfig>>,
}

impl CountingConnector {
    pub fn new(tool_names: &[&str]) -> Self {
        Self {
            tool_names: tool_names.iter().map(|s| s.to_string()).collect(),
            delay: None,
            fail: false,
            calls: AtomicUsize::new(0),
            last_config: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<McpServerConfig> {
        self.last_config.lock().clone()
    }
}

#[async_trait]
impl McpConnector for CountingConnector {
    async fn connect(&self, config: &McpServerConfig) -> McpResult<Vec<SharedTool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock() = Some(config.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(McpError::ConnectionFailed(format!("{} refused", config.name)));
        }

        Ok(self
            .tool_names
            .iter()
            .map(|name| FunctionTool::sync(name.clone(), "test tool", |args: Value| Ok(args)).shared())
            .collect())
    }
}
