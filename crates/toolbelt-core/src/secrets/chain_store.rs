//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::{SecretInfo, SecretStore};

/// A secret store that tries several stores in order
///
/// Typical use: an in-memory override layered over the environment.
///
/// # Example
///
/// ```
/// use toolbelt_core::secrets::{SecretStore, ChainSecretStore, EnvSecretStore, MemorySecretStore};
/// use std::sync::Arc;
///
/// let overrides = Arc::new(MemorySecretStore::new().with("dashscope", "sk-override"));
/// let chain = ChainSecretStore::new(vec![overrides, Arc::new(EnvSecretStore::new())]);
/// assert_eq!(chain.get("dashscope"), Some("sk-override".to_string()));
/// ```
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }

    /// Find which store has a key
    pub fn find_store(&self, key: &str) -> Option<&Arc<dyn SecretStore>> {
        self.stores
            .iter()
            .find(|store| store.is_available() && store.has(key))
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores
            .iter()
            .filter(|store| store.is_available())
            .find_map(|store| store.get(key))
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        match self.find_store(key) {
            Some(store) => SecretInfo::new(true, store.name()),
            None => SecretInfo::not_found(),
        }
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stores.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainSecretStore")
            .field("stores", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    struct OfflineStore;

    impl SecretStore for OfflineStore {
        fn name(&self) -> &str {
            "offline"
        }
        fn is_available(&self) -> bool {
            false
        }
        fn get(&self, _key: &str) -> Option<String> {
            Some("should-not-be-read".to_string())
        }
    }

    #[test]
    fn test_chain_store_fallback_and_priority() {
        let first = Arc::new(MemorySecretStore::new().with("a", "first"));
        let second = Arc::new(MemorySecretStore::new().with("a", "second").with("b", "second"));

        let chain = ChainSecretStore::new(vec![first, second]);
        assert_eq!(chain.get("a"), Some("first".to_string()));
        assert_eq!(chain.get("b"), Some("second".to_string()));
        assert_eq!(chain.get("c"), None);
    }

    #[test]
    fn test_chain_store_skips_unavailable() {
        let chain = ChainSecretStore::new(vec![
            Arc::new(OfflineStore),
            Arc::new(MemorySecretStore::new().with("dashscope", "sk")),
        ]);

        assert_eq!(chain.get("dashscope"), Some("sk".to_string()));
        assert_eq!(chain.get_info("dashscope").source, "memory");
        assert_eq!(chain.get("other"), None);
    }

    #[test]
    fn test_empty_chain() {
        let chain = ChainSecretStore::new(vec![]);
        assert!(!chain.is_available());
        assert_eq!(chain.get("anything"), None);
    }
}
