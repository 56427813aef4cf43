//! Process-wide tool context
//!
//! Construct one [`ToolContext`] at startup and pass it to whatever needs
//! tools. It owns the settings, the spec registry, the tool manager, the MCP
//! connector and the background runtime used by synchronous lookups.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::catalog;
use super::manager::ToolManager;
use super::provider::{ProviderInfo, ProviderStatus, ToolProvider};
use super::registry::SpecRegistry;
use super::runtime::BlockingRuntime;
use super::spec::{ToolBuilder, ToolSpec};
use crate::config::{Settings, SpecSource};
use crate::error::{ToolError, ToolResult};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::mcp::{RmcpConnector, SharedConnector};
use crate::types::ToolSet;

/// Settings, specs, providers and cached tool lists
///
/// # Example
///
/// ```no_run
/// use toolbelt_core::tools::ToolContext;
///
/// # async fn run() -> toolbelt_core::ToolResult<()> {
/// let ctx = ToolContext::from_env()?;
/// let tools = ctx.get_tools_async("weather", false).await?;
/// println!("{:?}", tools.names());
/// # Ok(())
/// # }
/// ```
pub struct ToolContext {
    settings: Arc<Settings>,
    registry: SpecRegistry,
    manager: ToolManager,
    connector: SharedConnector,
    runtime: Arc<BlockingRuntime>,
    logger: SharedLogger,
    builtin_catalog: bool,
    /// Serializes provider installation against spec overrides
    registration: Mutex<()>,
}

/// Optional parts of a callable registration
///
/// ```
/// use std::time::Duration;
/// use toolbelt_core::tools::CallableOptions;
///
/// let options = CallableOptions::new()
///     .with_cache_ttl(Duration::from_secs(300))
///     .replacing();
/// assert!(options.replace);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallableOptions {
    pub cache_ttl: Option<Duration>,
    /// Override an existing spec of the same name instead of failing
    pub replace: bool,
}

impl CallableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }
}

impl ToolContext {
    pub fn builder(settings: Settings) -> ToolContextBuilder {
        ToolContextBuilder::new(settings)
    }

    /// Context with settings from the environment and the rmcp connector
    pub fn from_env() -> ToolResult<Self> {
        Ok(Self::builder(Settings::from_env()?).build())
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    pub fn manager(&self) -> &ToolManager {
        &self.manager
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Register a spec; an equal spec under the same name is a no-op
    pub fn register_spec(&self, spec: ToolSpec) -> ToolResult<()> {
        let name = spec.name().to_string();
        self.registry.register(spec)?;
        self.logger.debug(&format!("[ToolContext] Registered spec '{}'", name));
        Ok(())
    }

    /// Replace a spec and drop its provider so the next lookup rebuilds it
    pub fn register_spec_override(&self, spec: ToolSpec) -> ToolResult<()> {
        let name = spec.name().to_string();
        let _registering = self.registration.lock();
        let previous = self.registry.replace(spec)?;
        if self.manager.unregister(&name).is_some() || previous.is_some() {
            self.logger.info(&format!("[ToolContext] Overrode spec '{}'", name));
        }
        Ok(())
    }

    /// Register local tools produced by `builder`
    pub fn register_callable_tool<I, S>(
        &self,
        name: &str,
        builder: ToolBuilder,
        description: &str,
        tags: I,
    ) -> ToolResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register_callable_tool_with(name, builder, description, tags, CallableOptions::default())
    }

    /// [`register_callable_tool`](Self::register_callable_tool) with a TTL or override
    pub fn register_callable_tool_with<I, S>(
        &self,
        name: &str,
        builder: ToolBuilder,
        description: &str,
        tags: I,
        options: CallableOptions,
    ) -> ToolResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = ToolSpec::callable(name, builder)
            .with_description(description)
            .with_tags(tags);
        if let Some(ttl) = options.cache_ttl {
            spec = spec.with_cache_ttl(ttl);
        }

        if options.replace {
            self.register_spec_override(spec)
        } else {
            self.register_spec(spec)
        }
    }

    /// Make sure a provider exists for `name`
    ///
    /// Takes the registered spec, or the built-in one (registering it). The
    /// first concurrent caller's provider wins, and an override never sees
    /// a provider built from the spec it replaced.
    pub fn ensure_tool_registered(&self, name: &str) -> ToolResult<()> {
        if self.manager.is_registered(name) {
            return Ok(());
        }

        let _registering = self.registration.lock();
        if self.manager.is_registered(name) {
            return Ok(());
        }

        let spec = match self.registry.get(name) {
            Some(spec) => spec,
            None => {
                let builtin = self
                    .builtin_catalog
                    .then(|| catalog::builtin_spec(name))
                    .flatten()
                    .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
                self.registry.register(builtin)?
            }
        };

        self.manager.register_if_absent(Arc::new(self.build_provider(spec)));
        Ok(())
    }

    fn build_provider(&self, spec: Arc<ToolSpec>) -> ToolProvider {
        ToolProvider::new(
            spec,
            self.settings.clone(),
            self.connector.clone(),
            self.runtime.clone(),
            self.logger.clone(),
        )
    }

    /// Tools for `name` from synchronous code
    pub fn get_tools(&self, name: &str, refresh: bool) -> ToolResult<ToolSet> {
        self.ensure_tool_registered(name)?;
        self.manager.get_tools(name, refresh)
    }

    pub async fn get_tools_async(&self, name: &str, refresh: bool) -> ToolResult<ToolSet> {
        self.ensure_tool_registered(name)?;
        self.manager.get_tools_async(name, refresh).await
    }

    /// Tools of several names concatenated in order
    pub async fn collect_tools_async<S: AsRef<str>>(&self, names: &[S], refresh: bool) -> ToolResult<ToolSet> {
        let mut sets = Vec::with_capacity(names.len());
        for name in names {
            sets.push(self.get_tools_async(name.as_ref(), refresh).await?);
        }
        Ok(ToolSet::concat(&sets))
    }

    pub fn collect_tools<S: AsRef<str>>(&self, names: &[S], refresh: bool) -> ToolResult<ToolSet> {
        let sets = names
            .iter()
            .map(|name| self.get_tools(name.as_ref(), refresh))
            .collect::<ToolResult<Vec<_>>>()?;
        Ok(ToolSet::concat(&sets))
    }

    /// Register every spec a source declares; returns how many
    pub fn load_specs(&self, source: &dyn SpecSource) -> ToolResult<usize> {
        let specs = source.load_specs()?;
        let count = specs.len();
        for spec in specs {
            self.register_spec(spec)?;
        }
        self.logger.info(&format!(
            "[ToolContext] Loaded {} spec(s) from {} source",
            count,
            source.name()
        ));
        Ok(count)
    }

    /// Sorted names of registered specs
    pub fn list_specs(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn describe(&self, name: &str) -> ToolResult<ProviderInfo> {
        self.manager.describe(name)
    }

    pub fn list_providers(&self) -> Vec<ProviderInfo> {
        self.manager.list_providers()
    }

    pub fn status(&self, name: &str) -> ProviderStatus {
        self.manager.status(name)
    }

    pub fn clear_cache(&self, name: Option<&str>) {
        self.manager.clear_cache(name)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("settings", &self.settings)
            .field("specs", &self.registry.names())
            .field("manager", &self.manager)
            .finish()
    }
}

/// Builder for [`ToolContext`]
pub struct ToolContextBuilder {
    settings: Settings,
    connector: Option<SharedConnector>,
    logger: Option<SharedLogger>,
    builtin_catalog: bool,
}

impl ToolContextBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            connector: None,
            logger: None,
            builtin_catalog: true,
        }
    }

    /// Replace the rmcp connector (tests use a fake)
    pub fn connector(mut self, connector: SharedConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Disable lazy registration of built-in specs
    pub fn without_builtin_catalog(mut self) -> Self {
        self.builtin_catalog = false;
        self
    }

    pub fn build(self) -> ToolContext {
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(NoOpLogger::new()) as SharedLogger);
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(RmcpConnector::new(logger.clone())) as SharedConnector);

        ToolContext {
            settings: Arc::new(self.settings),
            registry: SpecRegistry::new(),
            manager: ToolManager::new(logger.clone()),
            connector,
            runtime: Arc::new(BlockingRuntime::new()),
            logger,
            builtin_catalog: self.builtin_catalog,
            registration: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemorySpecSource;
    use crate::secrets::MemorySecretStore;
    use crate::tools::spec::{McpTransportKind, StdioConnection};
    use crate::tools::testing::CountingConnector;
    use crate::types::{FunctionTool, ToolCall};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn context(secrets: MemorySecretStore, connector: Arc<CountingConnector>) -> ToolContext {
        ToolContext::builder(Settings::new(Arc::new(secrets)))
            .connector(connector)
            .build()
    }

    fn echo_builder() -> ToolBuilder {
        ToolBuilder::sync(|| {
            Ok(vec![FunctionTool::sync("echo", "Echo the arguments", |args: Value| Ok(args)).shared()])
        })
    }

    #[tokio::test]
    async fn test_echo_callable_tool() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        ctx.register_callable_tool("echo", echo_builder(), "Echo tools", ["local"])
            .unwrap();

        let tools = ctx.get_tools_async("echo", false).await.unwrap();
        assert_eq!(tools.names(), vec!["echo"]);

        let output = tools
            .execute(&ToolCall::new("call_1", "echo", json!({"x": 1})))
            .await;
        assert!(!output.is_error);
        assert_eq!(output.content, r#"{"x":1}"#);
    }

    #[test]
    fn test_echo_refresh_picks_up_new_tools() {
        let width = Arc::new(AtomicUsize::new(1));
        let current = width.clone();
        let builder = ToolBuilder::sync(move || {
            Ok((0..current.load(Ordering::SeqCst))
                .map(|i| FunctionTool::sync(format!("echo_{}", i), "Echo", |args: Value| Ok(args)).shared())
                .collect())
        });

        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        ctx.register_callable_tool("echo", builder, "Echo tools", ["local"])
            .unwrap();

        let first = ctx.get_tools("echo", false).unwrap();
        assert_eq!(first.names(), vec!["echo_0"]);

        width.store(2, Ordering::SeqCst);
        let cached = ctx.get_tools("echo", false).unwrap();
        assert_eq!(cached.len(), 1);
        assert!(ToolSet::ptr_eq(&first, &cached));

        let refreshed = ctx.get_tools("echo", true).unwrap();
        assert_eq!(refreshed.names(), vec!["echo_0", "echo_1"]);
        assert_eq!(ctx.get_tools("echo", false).unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_of_builtin() {
        let connector = Arc::new(
            CountingConnector::new(&["get_weather"]).with_delay(Duration::from_millis(50)),
        );
        let ctx = Arc::new(context(MemorySecretStore::new().with("dashscope", "sk-1"), connector.clone()));
        assert!(!ctx.manager().is_registered("weather"));
        assert!(ctx.list_specs().is_empty());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                tokio::spawn(async move { ctx.get_tools_async("weather", false).await })
            })
            .collect();

        let mut sets = Vec::new();
        for handle in handles {
            sets.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(connector.calls(), 1);
        assert!(sets.iter().all(|s| ToolSet::ptr_eq(s, &sets[0])));
        assert_eq!(sets[0].names(), vec!["get_weather"]);
        assert_eq!(ctx.list_specs(), vec!["weather"]);
    }

    #[test]
    fn test_override_racing_ensure_keeps_provider_current() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        let builders = [ToolBuilder::sync(|| Ok(vec![])), ToolBuilder::sync(|| Ok(vec![]))];
        ctx.register_spec(ToolSpec::callable("echo", builders[0].clone()))
            .unwrap();

        std::thread::scope(|scope| {
            let ctx = &ctx;
            let builders = &builders;
            for _ in 0..4 {
                scope.spawn(move || {
                    for _ in 0..200 {
                        ctx.ensure_tool_registered("echo").unwrap();
                    }
                });
            }
            scope.spawn(move || {
                for i in 0..200 {
                    ctx.register_spec_override(ToolSpec::callable("echo", builders[i % 2].clone()))
                        .unwrap();
                }
            });
        });

        ctx.ensure_tool_registered("echo").unwrap();
        let provider = ctx.manager().provider("echo").unwrap();
        assert!(Arc::ptr_eq(provider.spec(), &ctx.registry().get("echo").unwrap()));
    }

    #[test]
    fn test_callable_options() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        ctx.register_callable_tool_with(
            "echo",
            echo_builder(),
            "Echo tools",
            ["local"],
            CallableOptions::new().with_cache_ttl(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(
            ctx.registry().get("echo").unwrap().cache_ttl(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(ctx.get_tools("echo", false).unwrap().len(), 1);

        assert!(matches!(
            ctx.register_callable_tool("echo", echo_builder(), "", Vec::<String>::new()),
            Err(ToolError::DuplicateTool(_))
        ));

        ctx.register_callable_tool_with(
            "echo",
            ToolBuilder::sync(|| Ok(vec![])),
            "Silent",
            Vec::<String>::new(),
            CallableOptions::new().replacing(),
        )
        .unwrap();
        assert!(!ctx.manager().is_registered("echo"));
        assert!(ctx.get_tools("echo", false).unwrap().is_empty());
        assert_eq!(ctx.describe("echo").unwrap().description, "Silent");
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        ctx.ensure_tool_registered("weather").unwrap();
        let first = ctx.manager().provider("weather").unwrap();

        ctx.ensure_tool_registered("weather").unwrap();
        let second = ctx.manager().provider("weather").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ctx.list_specs(), vec!["weather"]);
    }

    #[test]
    fn test_unknown_name() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        assert!(matches!(
            ctx.ensure_tool_registered("nonexistent"),
            Err(ToolError::UnknownTool(_))
        ));
        assert!(matches!(ctx.get_tools("nonexistent", false), Err(ToolError::UnknownTool(_))));
    }

    #[test]
    fn test_builtin_catalog_can_be_disabled() {
        let ctx = ToolContext::builder(Settings::new(Arc::new(MemorySecretStore::new())))
            .connector(Arc::new(CountingConnector::new(&[])))
            .without_builtin_catalog()
            .build();
        assert!(matches!(
            ctx.ensure_tool_registered("weather"),
            Err(ToolError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_duplicate_and_identical_registration() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        let builder = echo_builder();

        ctx.register_spec(ToolSpec::callable("echo", builder.clone())).unwrap();
        ctx.register_spec(ToolSpec::callable("echo", builder)).unwrap();

        let err = ctx
            .register_spec(ToolSpec::callable("echo", echo_builder()))
            .unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool(_)));
    }

    #[tokio::test]
    async fn test_override_rebuilds_provider() {
        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        ctx.register_callable_tool("echo", echo_builder(), "", Vec::<String>::new())
            .unwrap();
        assert_eq!(ctx.get_tools_async("echo", false).await.unwrap().len(), 1);

        let empty = ToolBuilder::sync(|| Ok(vec![]));
        ctx.register_spec_override(ToolSpec::callable("echo", empty)).unwrap();
        assert!(!ctx.manager().is_registered("echo"));
        assert!(ctx.get_tools_async("echo", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_env_yields_empty_list() {
        let connector = Arc::new(CountingConnector::new(&["draw"]));
        let ctx = context(MemorySecretStore::new(), connector.clone());
        ctx.register_spec(ToolSpec::stdio(
            "drawing",
            StdioConnection::new("draw", "npx").env_factory(|_| Some(HashMap::new())),
        ))
        .unwrap();

        assert!(ctx.get_tools_async("drawing", false).await.unwrap().is_empty());
        assert!(ctx.status("drawing").is_disabled());
        assert_eq!(connector.calls(), 0);
    }

    #[tokio::test]
    async fn test_builtin_dashscope_with_key() {
        let connector = Arc::new(CountingConnector::new(&["get_weather"]));
        let ctx = context(MemorySecretStore::new().with("dashscope", "sk-1"), connector.clone());

        let tools = ctx.get_tools_async("weather", false).await.unwrap();
        assert_eq!(tools.names(), vec!["get_weather"]);

        let again = ctx.get_tools_async("weather", false).await.unwrap();
        assert!(ToolSet::ptr_eq(&tools, &again));
        assert_eq!(connector.calls(), 1);

        let info = ctx.describe("weather").unwrap();
        assert!(info.cached);
        assert_eq!(info.tags, vec!["dashscope", "mcp", "sse", "weather"]);
    }

    #[tokio::test]
    async fn test_async_builder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let builder = ToolBuilder::new_async(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![FunctionTool::new_async("later", "Deferred", |args: Value| async move { Ok(args) }).shared()])
            }
        });

        let ctx = context(MemorySecretStore::new(), Arc::new(CountingConnector::new(&[])));
        ctx.register_callable_tool("later", builder, "", ["async"]).unwrap();

        assert_eq!(ctx.get_tools_async("later", false).await.unwrap().names(), vec!["later"]);
        assert!(matches!(
            ctx.get_tools("later", true),
            Err(ToolError::AsyncBuilderMisuse(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_specs_and_collect() {
        let connector = Arc::new(CountingConnector::new(&["search"]));
        let ctx = context(MemorySecretStore::new(), connector);
        let source = MemorySpecSource::with_specs(vec![
            ToolSpec::callable("echo", echo_builder()),
            ToolSpec::dashscope("weather", "weather", McpTransportKind::Sse),
        ]);

        assert_eq!(ctx.load_specs(&source).unwrap(), 2);
        assert_eq!(ctx.list_specs(), vec!["echo", "weather"]);

        let tools = ctx.collect_tools(&["echo", "weather"], false).unwrap();
        assert_eq!(tools.names(), vec!["echo"]);
        assert_eq!(ctx.list_providers().len(), 2);
    }
}
