//! Application configuration.
//!
//! Optional settings live in `config.toml` inside the data directory. Every
//! field may be omitted; the built-in defaults apply.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::client::{SlashPolicy, DEFAULT_TIMEOUT_SECS};
use crate::platform::data_dir;

pub const DEFAULT_API_HOST: &str = "http://localhost:8000";
pub const API_HOST_ENV: &str = "MONFARISTO_API_HOST";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the journal API, e.g. `https://api.example.com`
    #[serde(default)]
    pub api_host: Option<String>,

    /// Request timeout ceiling in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Trailing-slash convention the API router expects
    #[serde(default)]
    pub slash_policy: Option<SlashPolicy>,
}

impl AppConfig {
    /// Load config from the default location, returning defaults if the file doesn't exist.
    pub fn load() -> ConfigResult<Self> {
        let dir = data_dir().map_err(|e| ConfigError::DataDir(e.to_string()))?;
        Self::load_from(&dir.join("config.toml"))
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.timeout_secs == Some(0) {
            return Err(ConfigError::Parse {
                path: path.to_path_buf(),
                message: "timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    /// Pick the API host: explicit flag, then environment, then config file, then the default.
    pub fn api_host(&self, flag: Option<&str>, env: Option<&str>) -> String {
        [flag, env, self.api_host.as_deref()]
            .into_iter()
            .flatten()
            .find(|host| !host.trim().is_empty())
            .unwrap_or(DEFAULT_API_HOST)
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn slash_policy(&self) -> SlashPolicy {
        self.slash_policy.unwrap_or_default()
    }
}

/// Write `content` to `path` atomically with owner-only permissions.
pub fn write_private(path: &Path, content: &str) -> ConfigResult<()> {
    let write_err = |e: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let temp_path = path.with_extension("toml.tmp");
    fs::write(&temp_path, content).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
    }

    fs::rename(&temp_path, path).map_err(write_err)?;

    Ok(())
}
