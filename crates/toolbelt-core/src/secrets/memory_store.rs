//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::SecretStore;

/// In-memory secret store for tests and embedding hosts
///
/// # Example
///
/// ```
/// use toolbelt_core::secrets::{SecretStore, MemorySecretStore};
///
/// let store = MemorySecretStore::new().with("amap_maps", "amap-key");
/// assert_eq!(store.get("amap_maps"), Some("amap-key".to_string()));
/// ```
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store with initial values
    pub fn with_secrets(initial: HashMap<String, String>) -> Self {
        Self {
            secrets: RwLock::new(initial),
        }
    }

    /// Builder-style insert
    pub fn with(self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.secrets.write().insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.secrets.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).filter(|v| !v.is_empty()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_insert_remove() {
        let store = MemorySecretStore::new();
        assert!(store.is_empty());

        store.insert("dashscope", "sk-1");
        assert_eq!(store.get("dashscope"), Some("sk-1".to_string()));

        store.insert("dashscope", "sk-2");
        assert_eq!(store.get("dashscope"), Some("sk-2".to_string()));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove("dashscope"), Some("sk-2".to_string()));
        assert!(!store.has("dashscope"));
    }

    #[test]
    fn test_memory_store_empty_value_is_absent() {
        let store = MemorySecretStore::new().with("amap_maps", "");
        assert_eq!(store.get("amap_maps"), None);
        assert!(!store.get_info("amap_maps").available);
    }

    #[test]
    fn test_memory_store_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemorySecretStore::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let key = format!("key_{}", i);
                    store.insert(&key, "value");
                    assert!(store.has(&key));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
