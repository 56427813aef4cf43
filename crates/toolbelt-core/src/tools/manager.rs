//! Tool manager: providers by name plus a cache of materialized tool lists

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;

use super::provider::{ProviderInfo, ProviderStatus, ToolProvider};
use super::runtime::BlockingRuntime;
use crate::error::{ToolError, ToolResult};
use crate::logging::SharedLogger;
use crate::types::ToolSet;

#[derive(Clone)]
struct CacheEntry {
    tools: ToolSet,
    stored_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    /// An entry whose age reaches the TTL is expired
    fn is_fresh(&self, now: Instant) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => now.saturating_duration_since(self.stored_at) < ttl,
        }
    }
}

/// Looks up providers by name and caches what they materialize
///
/// At most one materialization per name is in flight; later callers wait
/// for it and reuse the cached result. The cache is written only after a
/// materialization completes, so a cancelled lookup leaves nothing behind.
pub struct ToolManager {
    providers: RwLock<HashMap<String, Arc<ToolProvider>>>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    logger: SharedLogger,
}

impl ToolManager {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            logger,
        }
    }

    /// Register a provider under its spec name
    ///
    /// Fails with [`ToolError::DuplicateTool`] unless `replace` is set; a
    /// replaced provider loses its cache entry.
    pub fn register_provider(&self, provider: Arc<ToolProvider>, replace: bool) -> ToolResult<()> {
        let name = provider.name().to_string();
        {
            let mut providers = self.providers.write();
            if providers.contains_key(&name) && !replace {
                return Err(ToolError::DuplicateTool(name));
            }
            providers.insert(name.clone(), provider);
        }
        self.cache.write().remove(&name);
        self.logger.debug(&format!("[ToolManager] Registered provider '{}'", name));
        Ok(())
    }

    /// Insert the provider unless one already exists; returns the winner
    pub fn register_if_absent(&self, provider: Arc<ToolProvider>) -> Arc<ToolProvider> {
        let mut providers = self.providers.write();
        let winner = providers
            .entry(provider.name().to_string())
            .or_insert_with(|| provider.clone())
            .clone();
        if Arc::ptr_eq(&winner, &provider) {
            self.logger.debug(&format!("[ToolManager] Registered provider '{}'", winner.name()));
        }
        winner
    }

    /// Remove a provider and its cache entry
    pub fn unregister(&self, name: &str) -> Option<Arc<ToolProvider>> {
        let removed = self.providers.write().remove(name);
        self.cache.write().remove(name);
        removed
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    pub fn provider(&self, name: &str) -> Option<Arc<ToolProvider>> {
        self.providers.read().get(name).cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn require(&self, name: &str) -> ToolResult<Arc<ToolProvider>> {
        self.provider(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    fn cached(&self, name: &str) -> Option<ToolSet> {
        let cache = self.cache.read();
        let entry = cache.get(name)?;
        entry.is_fresh(Instant::now()).then(|| entry.tools.clone())
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cached(name).is_some()
    }

    fn store(&self, provider: &Arc<ToolProvider>, tools: &ToolSet) {
        // A provider replaced mid-flight must not receive the old result.
        let current = self.provider(provider.name());
        if !current.is_some_and(|p| Arc::ptr_eq(&p, provider)) {
            return;
        }
        self.cache.write().insert(
            provider.name().to_string(),
            CacheEntry {
                tools: tools.clone(),
                stored_at: Instant::now(),
                ttl: provider.cache_ttl(),
            },
        );
    }

    fn inflight_lock(&self, name: &str) -> Arc<AsyncMutex<()>> {
        self.inflight
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Tools for `name`, from cache unless expired or `refresh` is set
    ///
    /// From inside an async runtime this only succeeds for cache hits and
    /// sync builders; use [`ToolManager::get_tools_async`] there.
    pub fn get_tools(&self, name: &str, refresh: bool) -> ToolResult<ToolSet> {
        let provider = self.require(name)?;
        if !refresh {
            if let Some(tools) = self.cached(name) {
                return Ok(tools);
            }
        }

        let lock = self.inflight_lock(name);
        let _guard = if BlockingRuntime::in_async_context() {
            lock.try_lock()
                .map_err(|_| ToolError::BlockingInRuntime(name.to_string()))?
        } else {
            lock.blocking_lock()
        };

        if !refresh {
            if let Some(tools) = self.cached(name) {
                return Ok(tools);
            }
        }

        let tools = provider.materialize()?;
        self.store(&provider, &tools);
        Ok(tools)
    }

    pub async fn get_tools_async(&self, name: &str, refresh: bool) -> ToolResult<ToolSet> {
        let provider = self.require(name)?;
        if !refresh {
            if let Some(tools) = self.cached(name) {
                return Ok(tools);
            }
        }

        let lock = self.inflight_lock(name);
        let _guard = lock.lock().await;

        if !refresh {
            if let Some(tools) = self.cached(name) {
                return Ok(tools);
            }
        }

        let tools = provider.materialize_async().await?;
        self.store(&provider, &tools);
        Ok(tools)
    }

    pub fn status(&self, name: &str) -> ProviderStatus {
        match self.provider(name) {
            Some(provider) => provider.status(),
            None => ProviderStatus::Unregistered,
        }
    }

    pub fn describe(&self, name: &str) -> ToolResult<ProviderInfo> {
        let provider = self.require(name)?;
        let mut info = provider.metadata();
        info.cached = self.is_cached(name);
        Ok(info)
    }

    /// Every provider, sorted by name
    pub fn list_providers(&self) -> Vec<ProviderInfo> {
        self.names()
            .iter()
            .filter_map(|name| self.describe(name).ok())
            .collect()
    }

    /// Drop one cache entry, or all of them
    pub fn clear_cache(&self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.cache.write().remove(name);
            }
            None => self.cache.write().clear(),
        }
    }
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("providers", &self.names())
            .field("cached", &self.cache.read().len())
            .finish()
    }
}
