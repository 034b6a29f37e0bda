//! Configuration management for Gramcast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default Graph API endpoint
pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v18.0";

/// Environment variable that overrides the token file
pub const ACCESS_TOKEN_ENV: &str = "GRAMCAST_ACCESS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub instagram: InstagramConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    /// Base URL of the Graph API. Overridable to point tests at a local server.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// File holding the access token used for publish calls
    pub token_file: Option<String>,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_file: None,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Seconds between ticks
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Cap on concurrent per-post publish tasks. None means unbounded.
    #[serde(default)]
    pub max_concurrent_publishes: Option<usize>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_concurrent_publishes: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Owner id used by CLIs when --owner is not given
    #[serde(default = "default_owner")]
    pub owner: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
        }
    }
}

fn default_owner() -> String {
    "default".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/gramcast/posts.db".to_string(),
            },
            instagram: InstagramConfig {
                api_base: DEFAULT_API_BASE.to_string(),
                token_file: Some("~/.config/gramcast/instagram.token".to_string()),
            },
            scheduling: SchedulingConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }

    /// Resolve the publish access token once, at construction time.
    ///
    /// Checks the environment first, then the configured token file. An
    /// absent token resolves to an empty string; the publisher raises the
    /// distinct not-configured error on its first use.
    pub fn resolve_access_token(&self) -> String {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            return token.trim().to_string();
        }

        if let Some(token_file) = &self.instagram.token_file {
            let path = shellexpand::tilde(token_file).to_string();
            if let Ok(content) = std::fs::read_to_string(&path) {
                return content.trim().to_string();
            }
        }

        String::new()
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("GRAMCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("gramcast").join("config.toml"))
}
