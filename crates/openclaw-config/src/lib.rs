//! openclaw-config: TOML configuration for the openclaw gateway.
//!
//! Policy-relevant sections: the global `[tools]` policy, user-defined
//! `[profiles.*]`, per-agent `[agents.*.tools]`, and per-group allowlists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use openclaw_types::{NamedProfileConfig, ToolsConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Configuration for a single agent instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name for this agent.
    pub name: String,
    /// Model ID to use (e.g. "anthropic/claude-sonnet-4").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tool policy for this agent.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Configuration for a group chat binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Tools allowed in this group. Empty means no group restriction.
    #[serde(default)]
    pub tools_allow: Vec<String>,
}

/// Storage paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the session database. Defaults to `<config dir>/sessions.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the session database path, falling back to the config dir.
    pub fn session_db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("sessions.db")),
        }
    }
}

/// Top-level openclaw configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenClawConfig {
    /// Global tool policy.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// User-defined tool profiles, referenced by name from any policy layer.
    #[serde(default)]
    pub profiles: HashMap<String, NamedProfileConfig>,
    /// Named agent configurations.
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,
    /// Default agent name.
    #[serde(default = "default_agent_name")]
    pub default_agent: String,
    /// Group chat configurations.
    #[serde(default)]
    pub groups: HashMap<String, GroupConfig>,
    /// Storage paths.
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_agent_name() -> String {
    "default".to_string()
}

impl Default for OpenClawConfig {
    fn default() -> Self {
        let mut agents = HashMap::new();
        agents.insert(
            "default".to_string(),
            AgentConfig {
                name: "default".to_string(),
                model: Some("anthropic/claude-sonnet-4".to_string()),
                tools: ToolsConfig::default(),
            },
        );

        Self {
            tools: ToolsConfig::default(),
            profiles: HashMap::new(),
            agents,
            default_agent: "default".to_string(),
            groups: HashMap::new(),
            storage: StorageConfig::default(),
        }
    }
}

/// Resolve the openclaw config directory (~/.openclaw/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".openclaw"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.openclaw/config.toml).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<OpenClawConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<OpenClawConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(OpenClawConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: OpenClawConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Save configuration to the default path.
pub fn save_config(config: &OpenClawConfig) -> Result<(), ConfigError> {
    let dir = ensure_config_dir()?;
    let path = dir.join("config.toml");
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
