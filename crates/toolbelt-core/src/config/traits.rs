//! Spec source trait

use crate::tools::ToolSpec;

/// Source of tool specs
///
/// Implementations:
/// - `MemorySpecSource`: In-memory for testing
/// - `FileSpecSource`: Reads from YAML file (~/.config/toolbelt/tools.yaml)
pub trait SpecSource: Send + Sync {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Load every spec this source declares
    fn load_specs(&self) -> ConfigResult<Vec<ToolSpec>>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid tool entry '{name}': {message}")]
    InvalidEntry { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid_entry(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
