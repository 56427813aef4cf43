//! Declarative tool specs
//!
//! A [`ToolSpec`] says how to obtain a tool list: spawn a local stdio MCP
//! server, connect to a DashScope-hosted server, connect to any other
//! hosted MCP endpoint, or call a builder function. Specs are immutable once
//! registered.
//!
//! Equality is structural. Data fields compare by value; function-valued
//! fields (env factories, builders) compare by identity of the shared
//! function, so cloning a spec keeps it equal to the original.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{ToolError, ToolResult};
use crate::types::SharedTool;

/// Network transport of a hosted MCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum McpTransportKind {
    #[default]
    Sse,
    StreamableHttp,
}

impl McpTransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            McpTransportKind::Sse => "sse",
            McpTransportKind::StreamableHttp => "streamable_http",
        }
    }

    /// Last path segment DashScope uses for this transport
    pub fn dashscope_suffix(&self) -> &'static str {
        match self {
            McpTransportKind::Sse => "sse",
            McpTransportKind::StreamableHttp => "mcp",
        }
    }
}

impl fmt::Display for McpTransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces extra environment variables for a stdio server
///
/// Returning `None` means the server cannot run (for example a required key
/// is missing) and the provider reports itself disabled.
pub type EnvFactory = Arc<dyn Fn(&Settings) -> Option<HashMap<String, String>> + Send + Sync>;

type SyncBuilderFn = Arc<dyn Fn() -> ToolResult<Vec<SharedTool>> + Send + Sync>;
type AsyncBuilderFn = Arc<dyn Fn() -> BoxFuture<'static, ToolResult<Vec<SharedTool>>> + Send + Sync>;
type ConfiguredBuilderFn = Arc<dyn Fn(&Settings) -> ToolResult<Vec<SharedTool>> + Send + Sync>;

/// Function that builds the tools of a callable spec
#[derive(Clone)]
pub enum ToolBuilder {
    Sync(SyncBuilderFn),
    Async(AsyncBuilderFn),
    /// Sync builder that reads credentials or endpoints from the settings
    Configured(ConfiguredBuilderFn),
}

impl ToolBuilder {
    /// Builder usable from both the sync and the async path
    pub fn sync<F>(func: F) -> Self
    where
        F: Fn() -> ToolResult<Vec<SharedTool>> + Send + Sync + 'static,
    {
        ToolBuilder::Sync(Arc::new(func))
    }

    /// Builder usable only from the async path
    pub fn new_async<F, Fut>(func: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ToolResult<Vec<SharedTool>>> + Send + 'static,
    {
        ToolBuilder::Async(Arc::new(move || -> BoxFuture<'static, ToolResult<Vec<SharedTool>>> {
            Box::pin(func())
        }))
    }

    /// Builder handed the context's settings, usable from both paths
    pub fn configured<F>(func: F) -> Self
    where
        F: Fn(&Settings) -> ToolResult<Vec<SharedTool>> + Send + Sync + 'static,
    {
        ToolBuilder::Configured(Arc::new(func))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, ToolBuilder::Async(_))
    }
}

impl PartialEq for ToolBuilder {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ToolBuilder::Sync(a), ToolBuilder::Sync(b)) => Arc::ptr_eq(a, b),
            (ToolBuilder::Async(a), ToolBuilder::Async(b)) => Arc::ptr_eq(a, b),
            (ToolBuilder::Configured(a), ToolBuilder::Configured(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ToolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolBuilder::Sync(_) => f.write_str("ToolBuilder::Sync"),
            ToolBuilder::Async(_) => f.write_str("ToolBuilder::Async"),
            ToolBuilder::Configured(_) => f.write_str("ToolBuilder::Configured"),
        }
    }
}

/// Local MCP server launched over stdio
#[derive(Clone)]
pub struct StdioConnection {
    pub server_name: String,
    pub command: String,
    pub args: Vec<String>,
    /// Fixed environment variables
    pub env: BTreeMap<String, String>,
    /// Environment variable name → credential key resolved through the settings
    pub secret_env: BTreeMap<String, String>,
    /// Computed environment variables
    pub env_factory: Option<EnvFactory>,
    /// Treat an empty resolved environment as "cannot run"
    pub requires_env: bool,
}

impl StdioConnection {
    pub fn new(server_name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            secret_env: BTreeMap::new(),
            env_factory: None,
            requires_env: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Pass a credential to the server as an environment variable
    ///
    /// A missing credential disables the provider.
    pub fn secret_env(mut self, var: impl Into<String>, credential: impl Into<String>) -> Self {
        self.secret_env.insert(var.into(), credential.into());
        self
    }

    /// Compute environment variables at materialization time
    ///
    /// Marks the environment as required: `None` or an empty map disables
    /// the provider.
    pub fn env_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Settings) -> Option<HashMap<String, String>> + Send + Sync + 'static,
    {
        self.env_factory = Some(Arc::new(factory));
        self.requires_env = true;
        self
    }

    /// Like [`StdioConnection::env_factory`] but an empty map is acceptable
    pub fn optional_env_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Settings) -> Option<HashMap<String, String>> + Send + Sync + 'static,
    {
        self.env_factory = Some(Arc::new(factory));
        self.requires_env = false;
        self
    }
}

impl PartialEq for StdioConnection {
    fn eq(&self, other: &Self) -> bool {
        let factories_match = match (&self.env_factory, &other.env_factory) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        factories_match
            && self.server_name == other.server_name
            && self.command == other.command
            && self.args == other.args
            && self.env == other.env
            && self.secret_env == other.secret_env
            && self.requires_env == other.requires_env
    }
}

impl fmt::Debug for StdioConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdioConnection")
            .field("server_name", &self.server_name)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("secret_env", &self.secret_env)
            .field("env_factory", &self.env_factory.is_some())
            .field("requires_env", &self.requires_env)
            .finish()
    }
}

/// MCP server hosted on DashScope, authenticated with the `dashscope` credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashScopeConnection {
    pub server_name: String,
    pub transport: McpTransportKind,
}

/// Externally hosted MCP server with a fixed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConnection {
    pub server_name: String,
    pub transport: McpTransportKind,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl RemoteConnection {
    pub fn new(
        server_name: impl Into<String>,
        transport: McpTransportKind,
        url: impl Into<String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            transport,
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// How a spec obtains its tools
#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    Stdio(StdioConnection),
    DashScope(DashScopeConnection),
    Remote(RemoteConnection),
    Callable(ToolBuilder),
}

/// Spec kind, mostly for display and metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    Stdio,
    DashScope,
    Remote,
    Callable,
}

impl SpecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecKind::Stdio => "stdio",
            SpecKind::DashScope => "dashscope",
            SpecKind::Remote => "remote",
            SpecKind::Callable => "callable",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of a tool list
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use toolbelt_core::tools::{McpTransportKind, ToolSpec};
///
/// let spec = ToolSpec::dashscope("weather", "weather", McpTransportKind::Sse)
///     .with_description("Realtime weather")
///     .with_tags(["weather"])
///     .with_cache_ttl(Duration::from_secs(600));
///
/// assert_eq!(spec.name(), "weather");
/// assert_eq!(spec.kind().as_str(), "dashscope");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    name: String,
    description: String,
    tags: BTreeSet<String>,
    cache_ttl: Option<Duration>,
    /// Credential keys that must resolve before materializing
    required_credentials: BTreeSet<String>,
    connection: Connection,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, connection: Connection) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: BTreeSet::new(),
            cache_ttl: None,
            required_credentials: BTreeSet::new(),
            connection,
        }
    }

    pub fn stdio(name: impl Into<String>, connection: StdioConnection) -> Self {
        Self::new(name, Connection::Stdio(connection))
    }

    pub fn dashscope(
        name: impl Into<String>,
        server_name: impl Into<String>,
        transport: McpTransportKind,
    ) -> Self {
        Self::new(
            name,
            Connection::DashScope(DashScopeConnection {
                server_name: server_name.into(),
                transport,
            }),
        )
    }

    pub fn remote(name: impl Into<String>, connection: RemoteConnection) -> Self {
        Self::new(name, Connection::Remote(connection))
    }

    pub fn callable(name: impl Into<String>, builder: ToolBuilder) -> Self {
        Self::new(name, Connection::Callable(builder))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Disable the spec unless every credential key is configured
    pub fn requires_credentials<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_credentials.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    pub fn required_credentials(&self) -> &BTreeSet<String> {
        &self.required_credentials
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn kind(&self) -> SpecKind {
        match &self.connection {
            Connection::Stdio(_) => SpecKind::Stdio,
            Connection::DashScope(_) => SpecKind::DashScope,
            Connection::Remote(_) => SpecKind::Remote,
            Connection::Callable(_) => SpecKind::Callable,
        }
    }

    /// Tags implied by the kind followed by the user tags
    pub fn provider_tags(&self) -> Vec<String> {
        let implied: Vec<String> = match &self.connection {
            Connection::Stdio(_) => vec!["stdio".into(), "mcp".into()],
            Connection::DashScope(c) => {
                vec!["dashscope".into(), "mcp".into(), c.transport.as_str().into()]
            }
            Connection::Remote(c) => vec!["mcp".into(), c.transport.as_str().into()],
            Connection::Callable(_) => vec!["callable".into()],
        };

        let mut tags = implied;
        for tag in &self.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    /// Reject specs that can never materialize
    pub fn validate(&self) -> ToolResult<()> {
        if self.name.trim().is_empty() {
            return Err(ToolError::invalid_spec(&self.name, "tool name is empty"));
        }

        match &self.connection {
            Connection::Stdio(c) => {
                if c.command.trim().is_empty() {
                    return Err(ToolError::invalid_spec(&self.name, "stdio command is empty"));
                }
                if c.server_name.trim().is_empty() {
                    return Err(ToolError::invalid_spec(&self.name, "server name is empty"));
                }
            }
            Connection::DashScope(c) => {
                if c.server_name.trim().is_empty() {
                    return Err(ToolError::invalid_spec(&self.name, "server name is empty"));
                }
            }
            Connection::Remote(c) => {
                if c.server_name.trim().is_empty() {
                    return Err(ToolError::invalid_spec(&self.name, "server name is empty"));
                }
                reqwest::Url::parse(&c.url).map_err(|e| {
                    ToolError::invalid_spec(&self.name, format!("invalid url '{}': {}", c.url, e))
                })?;
            }
            Connection::Callable(_) => {}
        }

        Ok(())
    }
}
