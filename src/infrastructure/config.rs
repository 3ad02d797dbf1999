//! Runtime configuration: `grocer.toml` plus environment overrides.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "GROCER_DATA_DIR";
pub const ENV_BACKEND_URL: &str = "GROCER_BACKEND_URL";
pub const ENV_CATALOG: &str = "GROCER_CATALOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for one run; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend_url: String,
    pub request_timeout_secs: u64,
    /// Defaults to `products.json` inside the data directory.
    pub catalog_path: Option<PathBuf>,
    pub log_filter: String,
    /// Push-messaging instance id of this device, re-sent when it changes.
    pub instance_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".grocer"),
            backend_url: "http://localhost:8080/api".to_string(),
            request_timeout_secs: 30,
            catalog_path: None,
            log_filter: "info".to_string(),
            instance_id: None,
        }
    }
}

impl Config {
    /// Reads `path` if it exists, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend_url = url;
        }
        if let Some(catalog) = lookup(ENV_CATALOG) {
            self.catalog_path = Some(PathBuf::from(catalog));
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("products.json"))
    }

    pub fn purchased_items_path(&self) -> PathBuf {
        self.data_dir.join("purchased_items.json")
    }

    pub fn user_path(&self) -> PathBuf {
        self.data_dir.join("user.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("grocer.log")
    }
}
