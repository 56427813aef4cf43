//! In-memory spec source

use parking_lot::RwLock;

use super::traits::{ConfigResult, SpecSource};
use crate::tools::ToolSpec;

/// In-memory spec source for testing
#[derive(Debug, Default)]
pub struct MemorySpecSource {
    specs: RwLock<Vec<ToolSpec>>,
}

impl MemorySpecSource {
    /// Create a new empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source with initial specs
    pub fn with_specs(specs: Vec<ToolSpec>) -> Self {
        Self {
            specs: RwLock::new(specs),
        }
    }

    /// Add a spec
    pub fn push(&self, spec: ToolSpec) {
        self.specs.write().push(spec);
    }

    /// Clear all specs
    pub fn clear(&self) {
        self.specs.write().clear();
    }

    pub fn len(&self) -> usize {
        self.specs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.read().is_empty()
    }
}

impl SpecSource for MemorySpecSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load_specs(&self) -> ConfigResult<Vec<ToolSpec>> {
        Ok(self.specs.read().clone())
    }
}
