//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::SecretStore;

/// Mapping from service names to environment variable names
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("dashscope", vec!["DASHSCOPE_API_KEY"]);
    m.insert("amap_maps", vec!["AMAP_MAPS_API_KEY", "AMAP_API_KEY"]);
    m.insert("tavily", vec!["TAVILY_API_KEY"]);
    m.insert("firecrawl", vec!["FIRECRAWL_API_KEY", "Firecrawl_API_KEY"]);
    m.insert("unstructured", vec!["UNSTRUCTURED_API_KEY"]);
    m.insert("siliconflow", vec!["SILICONFLOW_API_KEY"]);
    m.insert("ark", vec!["ARK_API_KEY"]);
    m.insert("langsmith", vec!["LANGSMITH_API_KEY"]);
    m.insert("jianyu_appid", vec!["JIANYU_APPID"]);
    m.insert("jianyu_key", vec!["JIANYU_KEY"]);
    m
});

/// Secret store that reads the process environment
///
/// Loading `.env` files is left to the host; this store only sees variables
/// that are already set.
///
/// # Service Mapping
///
/// - `dashscope` → `DASHSCOPE_API_KEY`
/// - `amap_maps` → `AMAP_MAPS_API_KEY` or `AMAP_API_KEY`
/// - `tavily` → `TAVILY_API_KEY`
/// - `jianyu_appid` / `jianyu_key` → `JIANYU_APPID` / `JIANYU_KEY`
/// - etc.
///
/// Any other key is tried verbatim, then as `<KEY>_API_KEY`.
///
/// # Example
///
/// ```
/// use toolbelt_core::secrets::{SecretStore, EnvSecretStore};
///
/// let store = EnvSecretStore::new();
///
/// // Equivalent if DASHSCOPE_API_KEY is set:
/// let a = store.get("dashscope");
/// let b = store.get("DASHSCOPE_API_KEY");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Get the environment variable names for a service
    pub fn env_vars_for(service: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(service.to_lowercase().as_str()).map(|v| v.as_slice())
    }

    fn non_empty(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = Self::non_empty(key) {
            return Some(value);
        }

        if let Some(vars) = Self::env_vars_for(key) {
            if let Some(value) = vars.iter().find_map(|var| Self::non_empty(var)) {
                return Some(value);
            }
        }

        Self::non_empty(&format!("{}_API_KEY", key.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_store_name() {
        assert_eq!(EnvSecretStore::new().name(), "env");
    }

    #[test]
    fn test_env_store_get_direct() {
        env::set_var("TOOLBELT_TEST_SECRET_DIRECT", "value");

        let store = EnvSecretStore::new();
        assert_eq!(store.get("TOOLBELT_TEST_SECRET_DIRECT"), Some("value".to_string()));

        env::remove_var("TOOLBELT_TEST_SECRET_DIRECT");
    }

    #[test]
    fn test_env_store_mapped_service() {
        env::set_var("TAVILY_API_KEY", "tvly-test");

        let store = EnvSecretStore::new();
        assert_eq!(store.get("tavily"), Some("tvly-test".to_string()));
        assert_eq!(store.get("Tavily"), Some("tvly-test".to_string()));

        env::remove_var("TAVILY_API_KEY");
    }

    #[test]
    fn test_env_store_suffix_fallback() {
        env::set_var("TOOLBELT_SUFFIX_API_KEY", "k");

        let store = EnvSecretStore::new();
        assert_eq!(store.get("toolbelt_suffix"), Some("k".to_string()));

        env::remove_var("TOOLBELT_SUFFIX_API_KEY");
    }

    #[test]
    fn test_env_store_empty_is_absent() {
        env::set_var("TOOLBELT_TEST_EMPTY_SECRET", "");

        let store = EnvSecretStore::new();
        assert!(!store.has("TOOLBELT_TEST_EMPTY_SECRET"));

        env::remove_var("TOOLBELT_TEST_EMPTY_SECRET");
    }

    #[test]
    fn test_env_vars_for() {
        assert_eq!(EnvSecretStore::env_vars_for("dashscope"), Some(&["DASHSCOPE_API_KEY"][..]));
        assert_eq!(EnvSecretStore::env_vars_for("jianyu_key"), Some(&["JIANYU_KEY"][..]));
        assert!(EnvSecretStore::env_vars_for("nonexistent_service_xyz").is_none());
    }
}
