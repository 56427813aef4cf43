//! Settings and spec sources
//!
//! - `Settings`: credentials, DashScope base URL, timeouts and TTL defaults
//! - `MemorySpecSource`: in-memory specs for testing
//! - `FileSpecSource`: YAML file-based specs (user/workspace level)

mod traits;
mod settings;
mod memory;
mod file;

pub use traits::{ConfigError, ConfigResult, SpecSource};
pub use settings::Settings;
pub use memory::MemorySpecSource;
pub use file::{ConfigLevel, ConnectionConfig, FileSpecSource, SpecConfig, ToolsConfigFile};
