//! Core traits and types for credential lookup

use std::sync::Arc;

/// Information about a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    /// Whether the credential exists
    pub available: bool,
    /// Which store provided it (useful for chain stores)
    pub source: String,
}

impl SecretInfo {
    pub fn new(available: bool, source: impl Into<String>) -> Self {
        Self {
            available,
            source: source.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            available: false,
            source: "none".to_string(),
        }
    }
}

/// Read-only credential store
///
/// Keys are either service names (`dashscope`, `amap_maps`) or raw
/// environment variable names (`DASHSCOPE_API_KEY`); how a key is resolved is
/// up to the implementation. Empty values count as absent.
///
/// # Example
///
/// ```
/// use toolbelt_core::secrets::{SecretStore, MemorySecretStore};
///
/// let store = MemorySecretStore::new();
/// store.insert("dashscope", "sk-test");
/// assert!(store.has("dashscope"));
/// ```
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Check if this store can currently be queried
    fn is_available(&self) -> bool {
        true
    }

    /// Retrieve a credential by key
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a credential exists
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Get information about a credential
    fn get_info(&self, key: &str) -> SecretInfo {
        if self.has(key) {
            SecretInfo::new(true, self.name())
        } else {
            SecretInfo::not_found()
        }
    }
}

/// Type alias for an Arc-wrapped secret store
pub type SharedSecretStore = Arc<dyn SecretStore>;
