//! File-based spec source (YAML)
//!
//! Supports user-level (~/.config/toolbelt/tools.yaml) and workspace-level
//! (.config/toolbelt/tools.yaml) tool declarations.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::traits::{ConfigError, ConfigResult, SpecSource};
use crate::tools::{McpTransportKind, RemoteConnection, StdioConnection, ToolSpec};

/// Tools file structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ToolsConfigFile {
    /// Declared tools
    #[serde(default)]
    pub tools: Vec<SpecConfig>,
}

/// One tool entry of the YAML file
///
/// ```yaml
/// tools:
///   - name: amap_maps
///     kind: stdio
///     server_name: amap-maps
///     command: npx
///     args: ["-y", "@amap/amap-maps-mcp-server"]
///     secret_env:
///       AMAP_MAPS_API_KEY: amap_maps
///   - name: weather
///     kind: dashscope
///     server_name: weather
///     transport: sse
///     cache_ttl_secs: 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<f64>,
    #[serde(flatten)]
    pub connection: ConnectionConfig,
}

/// Connection part of a tool entry, selected by `kind`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionConfig {
    Stdio {
        server_name: String,
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        /// Environment variable name → credential key
        #[serde(default)]
        secret_env: BTreeMap<String, String>,
    },
    Dashscope {
        server_name: String,
        #[serde(default)]
        transport: McpTransportKind,
    },
    Remote {
        server_name: String,
        transport: McpTransportKind,
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
}

impl SpecConfig {
    /// Convert into a spec, validating it
    pub fn to_spec(&self) -> ConfigResult<ToolSpec> {
        let spec = match &self.connection {
            ConnectionConfig::Stdio {
                server_name,
                command,
                args,
                env,
                secret_env,
            } => {
                let mut conn = StdioConnection::new(server_name, command).args(args.iter().cloned());
                conn.env = env.clone();
                conn.secret_env = secret_env.clone();
                ToolSpec::stdio(&self.name, conn)
            }
            ConnectionConfig::Dashscope {
                server_name,
                transport,
            } => ToolSpec::dashscope(&self.name, server_name, *transport),
            ConnectionConfig::Remote {
                server_name,
                transport,
                url,
                headers,
            } => {
                let mut conn = RemoteConnection::new(server_name, *transport, url);
                conn.headers = headers.clone();
                ToolSpec::remote(&self.name, conn)
            }
        };

        let mut spec = spec
            .with_description(&self.description)
            .with_tags(self.tags.iter().cloned());

        if let Some(secs) = self.cache_ttl_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::invalid_entry(
                    &self.name,
                    "cache_ttl_secs must be a positive number",
                ));
            }
            let ttl = Duration::try_from_secs_f64(secs).map_err(|_| {
                ConfigError::invalid_entry(&self.name, "cache_ttl_secs is out of range")
            })?;
            spec = spec.with_cache_ttl(ttl);
        }

        spec.validate()
            .map_err(|e| ConfigError::invalid_entry(&self.name, e.to_string()))?;
        Ok(spec)
    }
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/toolbelt/tools.yaml)
    User,
    /// Workspace-level config (.config/toolbelt/tools.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based spec source
///
/// A missing file declares no tools.
///
/// # Example
///
/// ```no_run
/// use toolbelt_core::config::FileSpecSource;
///
/// // User-level tools
/// let user_tools = FileSpecSource::user();
///
/// // Workspace-level tools
/// let workspace_tools = FileSpecSource::workspace("/path/to/workspace");
/// ```
pub struct FileSpecSource {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ToolsConfigFile>>,
}

impl FileSpecSource {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// User-level source (~/.config/toolbelt/tools.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("toolbelt").join("tools.yaml"), ConfigLevel::User)
    }

    /// Workspace-level source (.config/toolbelt/tools.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("toolbelt")
            .join("tools.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigResult<ToolsConfigFile> {
        if !self.path.exists() {
            return Ok(ToolsConfigFile::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: ToolsConfigFile = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Cached file contents, loading on first use
    pub fn config(&self) -> ConfigResult<ToolsConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }

        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Reload from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ToolsConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Write the file, creating parent directories
    pub fn save(&self, config: &ToolsConfigFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Add an entry; names must be unique within the file
    pub fn add_entry(&self, entry: SpecConfig) -> ConfigResult<()> {
        let mut config = self.config()?;
        if config.tools.iter().any(|t| t.name == entry.name) {
            return Err(ConfigError::invalid_entry(&entry.name, "already declared in this file"));
        }
        config.tools.push(entry);
        self.save(&config)
    }

    /// Remove an entry by name
    pub fn remove_entry(&self, name: &str) -> ConfigResult<bool> {
        let mut config = self.config()?;
        let before = config.tools.len();
        config.tools.retain(|t| t.name != name);
        if config.tools.len() == before {
            return Ok(false);
        }
        self.save(&config)?;
        Ok(true)
    }
}

impl std::fmt::Debug for FileSpecSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSpecSource")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

impl SpecSource for FileSpecSource {
    fn name(&self) -> &str {
        self.level.as_str()
    }

    fn load_specs(&self) -> ConfigResult<Vec<ToolSpec>> {
        self.config()?.tools.iter().map(SpecConfig::to_spec).collect()
    }
}
