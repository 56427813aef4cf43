//! Spec registry: name → spec table

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::spec::ToolSpec;
use crate::error::{ToolError, ToolResult};

/// Registered specs by name
///
/// Registering a spec equal to the one already present is a no-op; a
/// different spec under the same name is rejected.
#[derive(Debug, Default)]
pub struct SpecRegistry {
    specs: RwLock<HashMap<String, Arc<ToolSpec>>>,
}

impl SpecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec, returning the stored one
    pub fn register(&self, spec: ToolSpec) -> ToolResult<Arc<ToolSpec>> {
        spec.validate()?;

        let mut specs = self.specs.write();
        if let Some(existing) = specs.get(spec.name()) {
            if **existing == spec {
                return Ok(existing.clone());
            }
            return Err(ToolError::DuplicateTool(spec.name().to_string()));
        }

        let spec = Arc::new(spec);
        specs.insert(spec.name().to_string(), spec.clone());
        Ok(spec)
    }

    /// Replace (or insert) a spec, returning the previous one
    pub fn replace(&self, spec: ToolSpec) -> ToolResult<Option<Arc<ToolSpec>>> {
        spec.validate()?;
        let name = spec.name().to_string();
        Ok(self.specs.write().insert(name, Arc::new(spec)))
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolSpec>> {
        self.specs.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.specs.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.specs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.read().is_empty()
    }
}
