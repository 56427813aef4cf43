//! Tool provider: turns one spec into a tool list

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

use super::runtime::BlockingRuntime;
use super::spec::{Connection, McpTransportKind, SpecKind, StdioConnection, ToolBuilder, ToolSpec};
use crate::config::Settings;
use crate::error::{ToolError, ToolResult};
use crate::logging::SharedLogger;
use crate::{log_debug, log_info, log_warn};
use crate::mcp::{McpServerConfig, McpServerTransport, SharedConnector};
use crate::types::ToolSet;

/// Why a provider yields no tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledReason {
    /// A credential the server needs is not configured
    MissingCredential(String),
    /// The environment factory produced nothing usable
    MissingEnvironment,
    /// Connecting took longer than the configured timeout
    Timeout(Duration),
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisabledReason::MissingCredential(key) => write!(f, "missing credential '{}'", key),
            DisabledReason::MissingEnvironment => f.write_str("missing environment"),
            DisabledReason::Timeout(d) => write!(f, "timed out after {:.1}s", d.as_secs_f64()),
        }
    }
}

/// Observable state of a named provider
#[derive(Debug, Clone)]
pub enum ProviderStatus {
    /// No provider under this name
    Unregistered,
    /// Registered, never materialized
    Pending,
    Disabled(DisabledReason),
    Active(ToolSet),
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Unregistered => "unregistered",
            ProviderStatus::Pending => "pending",
            ProviderStatus::Disabled(_) => "disabled",
            ProviderStatus::Active(_) => "active",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ProviderStatus::Active(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, ProviderStatus::Disabled(_))
    }

    pub fn disabled_reason(&self) -> Option<&DisabledReason> {
        match self {
            ProviderStatus::Disabled(reason) => Some(reason),
            _ => None,
        }
    }
}

impl PartialEq for ProviderStatus {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ProviderStatus::Unregistered, ProviderStatus::Unregistered) => true,
            (ProviderStatus::Pending, ProviderStatus::Pending) => true,
            (ProviderStatus::Disabled(a), ProviderStatus::Disabled(b)) => a == b,
            (ProviderStatus::Active(a), ProviderStatus::Active(b)) => ToolSet::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Provider description for listings
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub kind: SpecKind,
    pub description: String,
    pub tags: Vec<String>,
    pub cache_ttl_secs: Option<f64>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
    pub tool_count: usize,
    pub cached: bool,
}

/// What materialization has to do, decided from spec and settings
enum Plan {
    Disabled(DisabledReason),
    Connect(McpServerConfig),
    Build(ToolBuilder),
}

/// Materializes one spec
///
/// Missing credentials are not errors: the provider records a
/// [`DisabledReason`], logs a warning and yields an empty [`ToolSet`].
pub struct ToolProvider {
    spec: Arc<ToolSpec>,
    settings: Arc<Settings>,
    connector: SharedConnector,
    runtime: Arc<BlockingRuntime>,
    logger: SharedLogger,
    status: RwLock<ProviderStatus>,
    last_materialized: RwLock<Option<Instant>>,
}

impl ToolProvider {
    pub fn new(
        spec: Arc<ToolSpec>,
        settings: Arc<Settings>,
        connector: SharedConnector,
        runtime: Arc<BlockingRuntime>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            spec,
            settings,
            connector,
            runtime,
            logger,
            status: RwLock::new(ProviderStatus::Pending),
            last_materialized: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn spec(&self) -> &Arc<ToolSpec> {
        &self.spec
    }

    /// Tags implied by the kind followed by the spec's tags
    pub fn tags(&self) -> Vec<String> {
        self.spec.provider_tags()
    }

    /// Spec TTL, falling back to the settings default
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.spec.cache_ttl().or(self.settings.default_cache_ttl())
    }

    pub fn status(&self) -> ProviderStatus {
        self.status.read().clone()
    }

    pub fn last_materialized(&self) -> Option<Instant> {
        *self.last_materialized.read()
    }

    pub fn metadata(&self) -> ProviderInfo {
        let status = self.status();
        let tool_count = match &status {
            ProviderStatus::Active(tools) => tools.len(),
            _ => 0,
        };
        ProviderInfo {
            name: self.name().to_string(),
            kind: self.spec.kind(),
            description: self.spec.description().to_string(),
            tags: self.tags(),
            cache_ttl_secs: self.cache_ttl().map(|d| d.as_secs_f64()),
            status: status.as_str().to_string(),
            disabled_reason: status.disabled_reason().map(|r| r.to_string()),
            tool_count,
            cached: false,
        }
    }

    /// Materialize from synchronous code
    ///
    /// Async builders are rejected. MCP specs run on the background runtime,
    /// which cannot be entered from inside another runtime.
    pub fn materialize(&self) -> ToolResult<ToolSet> {
        match self.plan()? {
            Plan::Disabled(reason) => Ok(self.disable(reason)),
            Plan::Build(ToolBuilder::Sync(build)) => {
                let tools = build()?;
                Ok(self.activate(ToolSet::new(tools)))
            }
            Plan::Build(ToolBuilder::Configured(build)) => {
                let tools = build(self.settings.as_ref())?;
                Ok(self.activate(ToolSet::new(tools)))
            }
            Plan::Build(ToolBuilder::Async(_)) => {
                Err(ToolError::AsyncBuilderMisuse(self.name().to_string()))
            }
            Plan::Connect(config) => {
                if BlockingRuntime::in_async_context() {
                    return Err(ToolError::BlockingInRuntime(self.name().to_string()));
                }
                self.runtime.block_on(self.connect(config))?
            }
        }
    }

    pub async fn materialize_async(&self) -> ToolResult<ToolSet> {
        match self.plan()? {
            Plan::Disabled(reason) => Ok(self.disable(reason)),
            Plan::Build(ToolBuilder::Sync(build)) => {
                let tools = build()?;
                Ok(self.activate(ToolSet::new(tools)))
            }
            Plan::Build(ToolBuilder::Configured(build)) => {
                let tools = build(self.settings.as_ref())?;
                Ok(self.activate(ToolSet::new(tools)))
            }
            Plan::Build(ToolBuilder::Async(build)) => {
                let tools = build().await?;
                Ok(self.activate(ToolSet::new(tools)))
            }
            Plan::Connect(config) => self.connect(config).await,
        }
    }

    async fn connect(&self, config: McpServerConfig) -> ToolResult<ToolSet> {
        log_debug!(
            self.logger,
            "[ToolProvider] Connecting '{}' to server '{}' over {}",
            self.name(),
            config.name,
            config.transport.as_str()
        );

        let connecting = self.connector.connect(&config);
        let result = match self.settings.materialize_timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, connecting).await {
                Ok(result) => result,
                Err(_) => return Ok(self.disable(DisabledReason::Timeout(timeout))),
            },
            None => connecting.await,
        };

        let tools = result.map_err(|e| ToolError::transport(self.name(), e))?;
        Ok(self.activate(ToolSet::new(tools)))
    }

    fn plan(&self) -> ToolResult<Plan> {
        let missing = self
            .spec
            .required_credentials()
            .iter()
            .find(|key| self.settings.credential(key).is_none());
        if let Some(key) = missing {
            return Ok(Plan::Disabled(DisabledReason::MissingCredential(key.clone())));
        }

        let plan = match self.spec.connection() {
            Connection::Stdio(conn) => match self.resolve_env(conn) {
                Ok(env) => Plan::Connect(McpServerConfig {
                    name: conn.server_name.clone(),
                    transport: McpServerTransport::Stdio {
                        command: conn.command.clone(),
                        args: conn.args.clone(),
                        env,
                    },
                }),
                Err(reason) => Plan::Disabled(reason),
            },
            Connection::DashScope(conn) => match self.settings.dashscope_api_key() {
                Some(key) => {
                    let url = self
                        .settings
                        .dashscope_mcp_url(&conn.server_name, conn.transport.dashscope_suffix());
                    let mut headers = BTreeMap::new();
                    headers.insert("Authorization".to_string(), format!("Bearer {}", key));
                    Plan::Connect(McpServerConfig {
                        name: conn.server_name.clone(),
                        transport: http_transport(conn.transport, url, headers),
                    })
                }
                None => Plan::Disabled(DisabledReason::MissingCredential("dashscope".to_string())),
            },
            Connection::Remote(conn) => Plan::Connect(McpServerConfig {
                name: conn.server_name.clone(),
                transport: http_transport(conn.transport, conn.url.clone(), conn.headers.clone()),
            }),
            Connection::Callable(builder) => Plan::Build(builder.clone()),
        };
        Ok(plan)
    }

    /// Fixed env, then credentials, then the factory
    fn resolve_env(&self, conn: &StdioConnection) -> Result<BTreeMap<String, String>, DisabledReason> {
        let mut env = conn.env.clone();

        for (var, key) in &conn.secret_env {
            let value = self
                .settings
                .credential(key)
                .ok_or_else(|| DisabledReason::MissingCredential(key.clone()))?;
            env.insert(var.clone(), value);
        }

        if let Some(factory) = &conn.env_factory {
            let produced = factory(self.settings.as_ref()).ok_or(DisabledReason::MissingEnvironment)?;
            env.extend(produced);
        }

        if conn.requires_env && env.is_empty() {
            return Err(DisabledReason::MissingEnvironment);
        }
        Ok(env)
    }

    fn disable(&self, reason: DisabledReason) -> ToolSet {
        log_warn!(self.logger, "[ToolProvider] Tool '{}' disabled: {}", self.name(), reason);
        *self.status.write() = ProviderStatus::Disabled(reason);
        *self.last_materialized.write() = Some(Instant::now());
        ToolSet::empty()
    }

    fn activate(&self, tools: ToolSet) -> ToolSet {
        log_info!(
            self.logger,
            "[ToolProvider] Tool '{}' materialized {} tool(s)",
            self.name(),
            tools.len()
        );
        *self.status.write() = ProviderStatus::Active(tools.clone());
        *self.last_materialized.write() = Some(Instant::now());
        tools
    }
}

fn http_transport(
    kind: McpTransportKind,
    url: String,
    headers: BTreeMap<String, String>,
) -> McpServerTransport {
    match kind {
        McpTransportKind::Sse => McpServerTransport::Sse { url, headers },
        McpTransportKind::StreamableHttp => McpServerTransport::StreamableHttp { url, headers },
    }
}

impl fmt::Debug for ToolProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolProvider")
            .field("name", &self.name())
            .field("kind", &self.spec.kind())
            .field("status", &self.status().as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;
    use crate::tools::spec::{RemoteConnection, StdioConnection};
    use crate::tools::testing::CountingConnector;
    use crate::types::FunctionTool;
    use std::collections::HashMap;

    fn provider(spec: ToolSpec, settings: Settings, connector: Arc<CountingConnector>) -> ToolProvider {
        ToolProvider::new(
            Arc::new(spec),
            Arc::new(settings),
            connector,
            Arc::new(BlockingRuntime::new()),
            Arc::new(NoOpLogger::new()),
        )
    }

    fn settings(secrets: MemorySecretStore) -> Settings {
        Settings::new(Arc::new(secrets)).with_dashscope_base_url("https://mcp.test")
    }

    #[tokio::test]
    async fn test_dashscope_without_key_is_disabled() {
        let connector = Arc::new(CountingConnector::new(&["weather_now"]));
        let p = provider(
            ToolSpec::dashscope("weather", "weather", McpTransportKind::Sse),
            settings(MemorySecretStore::new()),
            connector.clone(),
        );

        assert_eq!(p.status(), ProviderStatus::Pending);
        let tools = p.materialize_async().await.unwrap();
        assert!(tools.is_empty());
        assert_eq!(
            p.status(),
            ProviderStatus::Disabled(DisabledReason::MissingCredential("dashscope".into()))
        );
        assert_eq!(connector.calls(), 0);
    }

    #[tokio::test]
    async fn test_dashscope_connects_with_bearer_token() {
        let connector = Arc::new(CountingConnector::new(&["weather_now"]));
        let p = provider(
            ToolSpec::dashscope("weather", "weather", McpTransportKind::StreamableHttp),
            settings(MemorySecretStore::new().with("dashscope", "sk-1")),
            connector.clone(),
        );

        let tools = p.materialize_async().await.unwrap();
        assert_eq!(tools.names(), vec!["weather_now"]);
        assert!(p.status().is_active());

        let config = connector.last_config().unwrap();
        match config.transport {
            McpServerTransport::StreamableHttp { url, headers } => {
                assert_eq!(url, "https://mcp.test/api/v1/mcps/weather/mcp");
                assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer sk-1"));
            }
            other => panic!("unexpected transport: {:?}", other),
        }
    }

    #[test]
    fn test_configured_builder_reads_settings() {
        let builder = ToolBuilder::configured(|settings: &Settings| {
            let key = settings.credential("bids_key").unwrap_or_default();
            Ok(vec![FunctionTool::sync(format!("bids_{}", key), "Bids", Ok).shared()])
        });
        let spec = ToolSpec::callable("bids", builder).requires_credentials(["bids_key"]);

        let missing = provider(
            spec.clone(),
            settings(MemorySecretStore::new()),
            Arc::new(CountingConnector::new(&[])),
        );
        assert!(missing.materialize().unwrap().is_empty());
        assert_eq!(
            missing.status(),
            ProviderStatus::Disabled(DisabledReason::MissingCredential("bids_key".into()))
        );

        let keyed = provider(
            spec,
            settings(MemorySecretStore::new().with("bids_key", "k1")),
            Arc::new(CountingConnector::new(&[])),
        );
        assert_eq!(keyed.materialize().unwrap().names(), vec!["bids_k1"]);
        assert!(keyed.status().is_active());
    }

    #[tokio::test]
    async fn test_stdio_empty_required_env_is_disabled() {
        let connector = Arc::new(CountingConnector::new(&["draw"]));
        let spec = ToolSpec::stdio(
            "drawing",
            StdioConnection::new("draw", "npx").env_factory(|_| Some(HashMap::new())),
        );
        let p = provider(spec, settings(MemorySecretStore::new()), connector.clone());

        assert!(p.materialize_async().await.unwrap().is_empty());
        assert_eq!(p.status(), ProviderStatus::Disabled(DisabledReason::MissingEnvironment));
        assert_eq!(connector.calls(), 0);
    }

    #[tokio::test]
    async fn test_stdio_optional_env_connects() {
        let connector = Arc::new(CountingConnector::new(&["draw"]));
        let spec = ToolSpec::stdio(
            "drawing",
            StdioConnection::new("draw", "npx").optional_env_factory(|_| Some(HashMap::new())),
        );
        let p = provider(spec, settings(MemorySecretStore::new()), connector.clone());

        assert_eq!(p.materialize_async().await.unwrap().len(), 1);
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn test_stdio_secret_env() {
        let connector = Arc::new(CountingConnector::new(&["maps_geo"]));
        let spec = ToolSpec::stdio(
            "amap_maps",
            StdioConnection::new("amap-maps", "npx").secret_env("AMAP_MAPS_API_KEY", "amap_maps"),
        );

        let missing = provider(spec.clone(), settings(MemorySecretStore::new()), connector.clone());
        assert!(missing.materialize_async().await.unwrap().is_empty());
        assert_eq!(
            missing.status().disabled_reason(),
            Some(&DisabledReason::MissingCredential("amap_maps".into()))
        );

        let present = provider(
            spec,
            settings(MemorySecretStore::new().with("amap_maps", "amap-key")),
            connector.clone(),
        );
        assert_eq!(present.materialize_async().await.unwrap().len(), 1);
        match connector.last_config().unwrap().transport {
            McpServerTransport::Stdio { env, .. } => {
                assert_eq!(env.get("AMAP_MAPS_API_KEY").map(String::as_str), Some("amap-key"));
            }
            other => panic!("unexpected transport: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_disables() {
        let connector = Arc::new(
            CountingConnector::new(&["slow"]).with_delay(Duration::from_millis(500)),
        );
        let spec = ToolSpec::remote(
            "slow",
            RemoteConnection::new("slow", McpTransportKind::Sse, "https://mcp.test/sse"),
        );
        let settings = settings(MemorySecretStore::new())
            .with_materialize_timeout(Duration::from_millis(20));
        let p = provider(spec, settings, connector);

        assert!(p.materialize_async().await.unwrap().is_empty());
        assert_eq!(
            p.status(),
            ProviderStatus::Disabled(DisabledReason::Timeout(Duration::from_millis(20)))
        );
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let connector = Arc::new(CountingConnector::failing());
        let spec = ToolSpec::remote(
            "broken",
            RemoteConnection::new("broken", McpTransportKind::Sse, "https://mcp.test/sse"),
        );
        let p = provider(spec, settings(MemorySecretStore::new()), connector);

        let err = p.materialize_async().await.unwrap_err();
        assert!(matches!(err, ToolError::Transport { .. }));
        assert_eq!(p.status(), ProviderStatus::Pending);
    }

    #[test]
    fn test_sync_builder_on_sync_path() {
        let builder = ToolBuilder::sync(|| Ok(vec![FunctionTool::sync("echo", "Echo", Ok).shared()]));
        let p = provider(
            ToolSpec::callable("echo", builder),
            settings(MemorySecretStore::new()),
            Arc::new(CountingConnector::new(&[])),
        );
        assert_eq!(p.materialize().unwrap().names(), vec!["echo"]);
        assert!(p.last_materialized().is_some());
    }

    #[test]
    fn test_async_builder_on_sync_path_is_misuse() {
        let builder = ToolBuilder::new_async(|| async { Ok(vec![]) });
        let p = provider(
            ToolSpec::callable("later", builder),
            settings(MemorySecretStore::new()),
            Arc::new(CountingConnector::new(&[])),
        );
        assert!(matches!(p.materialize(), Err(ToolError::AsyncBuilderMisuse(_))));
    }

    #[test]
    fn test_sync_path_connects_on_background_runtime() {
        let connector = Arc::new(CountingConnector::new(&["search"]));
        let spec = ToolSpec::remote(
            "search",
            RemoteConnection::new("search", McpTransportKind::StreamableHttp, "https://mcp.test/mcp"),
        );
        let p = provider(spec, settings(MemorySecretStore::new()), connector.clone());

        assert_eq!(p.materialize().unwrap().names(), vec!["search"]);
        assert_eq!(connector.calls(), 1);
    }

    #[tokio::test]
    async fn test_sync_mcp_path_inside_runtime_is_rejected() {
        let spec = ToolSpec::remote(
            "search",
            RemoteConnection::new("search", McpTransportKind::Sse, "https://mcp.test/sse"),
        );
        let p = provider(
            spec,
            settings(MemorySecretStore::new()),
            Arc::new(CountingConnector::new(&["search"])),
        );
        assert!(matches!(p.materialize(), Err(ToolError::BlockingInRuntime(_))));
    }

    #[test]
    fn test_metadata() {
        let spec = ToolSpec::dashscope("weather", "weather", McpTransportKind::Sse)
            .with_description("Realtime weather")
            .with_tags(["weather"])
            .with_cache_ttl(Duration::from_secs(60));
        let p = provider(spec, settings(MemorySecretStore::new()), Arc::new(CountingConnector::new(&[])));

        let info = p.metadata();
        assert_eq!(info.kind, SpecKind::DashScope);
        assert_eq!(info.tags, vec!["dashscope", "mcp", "sse", "weather"]);
        assert_eq!(info.cache_ttl_secs, Some(60.0));
        assert_eq!(info.status, "pending");
    }
}
