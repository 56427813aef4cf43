//! Runtime settings consulted by tool providers

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{ConfigError, ConfigResult};
use crate::secrets::{EnvSecretStore, SharedSecretStore};

/// Settings shared by every provider of a context
///
/// Credentials are looked up through a [`SecretStore`](crate::secrets::SecretStore)
/// so tests can inject keys without touching the process environment.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use toolbelt_core::config::Settings;
/// use toolbelt_core::secrets::MemorySecretStore;
///
/// let secrets = MemorySecretStore::new().with("dashscope", "sk-test");
/// let settings = Settings::new(Arc::new(secrets))
///     .with_materialize_timeout(Duration::from_secs(30));
///
/// assert_eq!(settings.dashscope_api_key().as_deref(), Some("sk-test"));
/// ```
#[derive(Clone)]
pub struct Settings {
    secrets: SharedSecretStore,
    dashscope_base_url: String,
    materialize_timeout: Option<Duration>,
    default_cache_ttl: Option<Duration>,
    markmap_dir: PathBuf,
    jianyu_base_url: String,
}

impl Settings {
    pub const DEFAULT_DASHSCOPE_BASE_URL: &'static str = "https://dashscope.aliyuncs.com";
    pub const DEFAULT_JIANYU_BASE_URL: &'static str = "https://api.jianyu360.com/data/biddata";

    pub const DASHSCOPE_BASE_URL_VAR: &'static str = "DASHSCOPE_MCP_BASE_URL";
    pub const MATERIALIZE_TIMEOUT_VAR: &'static str = "TOOLBELT_MATERIALIZE_TIMEOUT_SECS";
    pub const CACHE_TTL_VAR: &'static str = "TOOLBELT_CACHE_TTL_SECS";
    pub const MARKMAP_DIR_VAR: &'static str = "MARKMAP_DIR";
    pub const JIANYU_BASE_URL_VAR: &'static str = "JIANYU_BASE_URL";

    /// Settings with defaults and the given credential store
    pub fn new(secrets: SharedSecretStore) -> Self {
        Self {
            secrets,
            dashscope_base_url: Self::DEFAULT_DASHSCOPE_BASE_URL.to_string(),
            materialize_timeout: None,
            default_cache_ttl: None,
            markmap_dir: default_markmap_dir(),
            jianyu_base_url: Self::DEFAULT_JIANYU_BASE_URL.to_string(),
        }
    }

    /// Settings read from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(Arc::new(EnvSecretStore::new()), |key| std::env::var(key).ok())
    }

    fn from_lookup<F>(secrets: SharedSecretStore, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut settings = Self::new(secrets);
        if let Some(url) = value(Self::DASHSCOPE_BASE_URL_VAR) {
            settings.dashscope_base_url = url;
        }
        if let Some(raw) = value(Self::MATERIALIZE_TIMEOUT_VAR) {
            settings.materialize_timeout = Some(parse_secs(Self::MATERIALIZE_TIMEOUT_VAR, &raw)?);
        }
        if let Some(raw) = value(Self::CACHE_TTL_VAR) {
            settings.default_cache_ttl = Some(parse_secs(Self::CACHE_TTL_VAR, &raw)?);
        }
        if let Some(dir) = value(Self::MARKMAP_DIR_VAR) {
            settings.markmap_dir = PathBuf::from(dir);
        }
        if let Some(url) = value(Self::JIANYU_BASE_URL_VAR) {
            settings.jianyu_base_url = url;
        }
        Ok(settings)
    }

    pub fn with_secrets(mut self, secrets: SharedSecretStore) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_dashscope_base_url(mut self, url: impl Into<String>) -> Self {
        self.dashscope_base_url = url.into();
        self
    }

    pub fn with_materialize_timeout(mut self, timeout: Duration) -> Self {
        self.materialize_timeout = Some(timeout);
        self
    }

    pub fn with_default_cache_ttl(mut self, ttl: Duration) -> Self {
        self.default_cache_ttl = Some(ttl);
        self
    }

    pub fn with_markmap_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.markmap_dir = dir.into();
        self
    }

    pub fn with_jianyu_base_url(mut self, url: impl Into<String>) -> Self {
        self.jianyu_base_url = url.into();
        self
    }

    pub fn secrets(&self) -> &SharedSecretStore {
        &self.secrets
    }

    /// Look up a credential by key (`dashscope`, `amap_maps`, ...)
    pub fn credential(&self, key: &str) -> Option<String> {
        self.secrets.get(key).filter(|v| !v.is_empty())
    }

    pub fn dashscope_api_key(&self) -> Option<String> {
        self.credential("dashscope")
    }

    pub fn amap_maps_api_key(&self) -> Option<String> {
        self.credential("amap_maps")
    }

    /// Base URL without a trailing slash
    pub fn dashscope_base_url(&self) -> &str {
        self.dashscope_base_url.trim_end_matches('/')
    }

    /// URL of a DashScope-hosted MCP server
    pub fn dashscope_mcp_url(&self, server_name: &str, suffix: &str) -> String {
        format!("{}/api/v1/mcps/{}/{}", self.dashscope_base_url(), server_name, suffix)
    }

    pub fn materialize_timeout(&self) -> Option<Duration> {
        self.materialize_timeout
    }

    pub fn default_cache_ttl(&self) -> Option<Duration> {
        self.default_cache_ttl
    }

    pub fn markmap_dir(&self) -> &PathBuf {
        &self.markmap_dir
    }

    /// Jianyu bid data API root, without a trailing slash
    pub fn jianyu_base_url(&self) -> &str {
        self.jianyu_base_url.trim_end_matches('/')
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("secrets", &self.secrets.name())
            .field("dashscope_base_url", &self.dashscope_base_url)
            .field("materialize_timeout", &self.materialize_timeout)
            .field("default_cache_ttl", &self.default_cache_ttl)
            .field("markmap_dir", &self.markmap_dir)
            .field("jianyu_base_url", &self.jianyu_base_url)
            .finish()
    }
}

fn parse_secs(key: &str, raw: &str) -> ConfigResult<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(key, format!("'{}' is not a number", raw)))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ConfigError::invalid_value(key, "must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ConfigError::invalid_value(key, format!("{} seconds is out of range", raw.trim())))
}

fn default_markmap_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
