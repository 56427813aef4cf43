//! Tool capability types
//!
//! Every materialized tool, whether it is a local function or a tool served
//! by a remote MCP server, is exposed through the [`Tool`] trait. A
//! [`ToolSet`] is the shared, immutable list a provider hands back.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ToolError, ToolResult};

/// Tool definition as advertised to an LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// A callable capability
///
/// Synchronous and asynchronous implementations share this one call
/// surface; callers always `await` [`Tool::invoke`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, unique within a tool set
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON Schema for the arguments
    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object" })
    }

    /// Invoke the tool with JSON arguments
    async fn invoke(&self, args: Value) -> ToolResult<Value>;

    /// Definition suitable for sending to an LLM
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description()).with_schema(self.input_schema())
    }
}

/// Type alias for an Arc-wrapped tool
pub type SharedTool = Arc<dyn Tool>;

type SyncHandler = Arc<dyn Fn(Value) -> ToolResult<Value> + Send + Sync>;
type AsyncHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ToolResult<Value>> + Send + Sync>;

#[derive(Clone)]
enum FunctionHandler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

/// A tool backed by a local Rust function
///
/// # Example
///
/// ```
/// use toolbelt_core::types::{FunctionTool, Tool};
/// use serde_json::json;
///
/// let echo = FunctionTool::sync("echo", "Echo the input back", |args| Ok(args));
/// assert_eq!(echo.name(), "echo");
/// assert!(!echo.is_async());
/// ```
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    input_schema: Value,
    handler: FunctionHandler,
}

impl FunctionTool {
    /// Create a tool from a synchronous function
    pub fn sync<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> ToolResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object" }),
            handler: FunctionHandler::Sync(Arc::new(func)),
        }
    }

    /// Create a tool from an asynchronous function
    pub fn new_async<F, Fut>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ToolResult<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object" }),
            handler: FunctionHandler::Async(Arc::new(move |args| -> BoxFuture<'static, ToolResult<Value>> {
                Box::pin(func(args))
            })),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Whether the underlying function is asynchronous
    pub fn is_async(&self) -> bool {
        matches!(self.handler, FunctionHandler::Async(_))
    }

    /// Wrap into a shared tool
    pub fn shared(self) -> SharedTool {
        Arc::new(self)
    }
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("is_async", &self.is_async())
            .finish()
    }
}

#[async_trait]
impl Tool for FunctionTool {
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
        match &self.handler {
            FunctionHandler::Sync(func) => func(args),
            FunctionHandler::Async(func) => func(args).await,
        }
    }
}

/// Tool call from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments for the tool
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Tool output to send back to the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// ID of the tool call this is responding to
    #[serde(rename = "callId")]
    pub call_id: String,
    /// The result content
    pub content: String,
    /// Whether this result represents an error
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolOutput {
    /// Create a successful tool output
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error tool output
    pub fn error(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: error.into(),
            is_error: true,
        }
    }
}

/// Shared, immutable list of materialized tools
///
/// Cloning is cheap and keeps pointing at the same list, so two cache hits
/// can be compared with [`ToolSet::ptr_eq`].
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Arc<Vec<SharedTool>>,
}

impl ToolSet {
    /// Create a tool set from a list of tools
    pub fn new(tools: Vec<SharedTool>) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }

    /// An empty tool set (what a disabled provider yields)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Concatenate several tool sets, keeping order
    pub fn concat<'a>(sets: impl IntoIterator<Item = &'a ToolSet>) -> Self {
        let tools = sets
            .into_iter()
            .flat_map(|set| set.tools.iter().cloned())
            .collect();
        Self::new(tools)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedTool> {
        self.tools.iter()
    }

    /// Find a tool by name
    pub fn get(&self, name: &str) -> Option<&SharedTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Names of all tools, in order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Definitions for sending to an LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Whether both sets share the same underlying list
    pub fn ptr_eq(a: &ToolSet, b: &ToolSet) -> bool {
        Arc::ptr_eq(&a.tools, &b.tools)
    }

    /// Execute a tool call from an LLM response
    pub async fn execute(&self, call: &ToolCall) -> ToolOutput {
        let Some(tool) = self.get(&call.name) else {
            let err = ToolError::UnknownTool(call.name.clone());
            return ToolOutput::error(call.id.clone(), format!("Error: {}", err));
        };

        match tool.invoke(call.input.clone()).await {
            Ok(Value::String(text)) => ToolOutput::success(call.id.clone(), text),
            Ok(value) => ToolOutput::success(call.id.clone(), value.to_string()),
            Err(e) => ToolOutput::error(call.id.clone(), format!("Error: {}", e)),
        }
    }

    /// Execute multiple tool calls in order
    pub async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute(call).await);
        }
        results
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.iter().map(|t| t.name())).finish()
    }
}

impl FromIterator<SharedTool> for ToolSet {
    fn from_iter<I: IntoIterator<Item = SharedTool>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
