//! Configuration loading for embedders.
//!
//! Values are resolved with priority: environment variables, then the
//! config file, then defaults. The config file is YAML at
//! `<config dir>/shoplist/config.yaml` unless an explicit path is given.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime configuration for the sync core and its HTTP gateways.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Owner of the `Users/<user_id>/...` collection tree.
    pub user_id: String,
    /// Base URL of the document server (e.g. "https://docs.example.com").
    pub server_url: Option<String>,
    /// Base URL of the blob server. Falls back to `server_url` when unset.
    pub blob_url: Option<String>,
    /// Bearer token for both servers.
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: "default".to_string(),
            server_url: None,
            blob_url: None,
            api_key: None,
        }
    }
}

impl Config {
    /// Loads configuration from `config_path` (or the default location)
    /// and applies environment overrides.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.clone(), e))?
        } else {
            Self::default()
        };

        if let Ok(user_id) = std::env::var("SHOPLIST_USER_ID") {
            config.user_id = user_id;
        }
        if let Ok(server_url) = std::env::var("SHOPLIST_SERVER_URL") {
            config.server_url = Some(server_url);
        }
        if let Ok(blob_url) = std::env::var("SHOPLIST_BLOB_URL") {
            config.blob_url = Some(blob_url);
        }
        if let Ok(api_key) = std::env::var("SHOPLIST_API_KEY") {
            config.api_key = Some(api_key);
        }

        Ok(config)
    }

    /// Default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoplist")
            .join("config.yaml")
    }

    /// True when a document server is configured.
    pub fn is_remote_configured(&self) -> bool {
        self.server_url.is_some()
    }

    /// Blob server base URL, defaulting to the document server.
    pub fn blob_base_url(&self) -> Option<&str> {
        self.blob_url.as_deref().or(self.server_url.as_deref())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    ReadError(PathBuf, io::Error),
    /// Config file could not be parsed.
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "failed to read config {}: {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
        }
    }
}
