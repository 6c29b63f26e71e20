//! Application configuration management.
//!
//! This module handles loading and saving the console configuration, which
//! holds the server base URL and the last used username.
//!
//! Configuration is stored at `~/.config/rotarr-console/config.json`; the
//! credential/cache storage directory lives under the platform cache dir.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/storage directory paths
const APP_NAME: &str = "rotarr-console";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Server base URL used when neither config nor environment set one.
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8077";

/// Environment variable overriding the server base URL.
const BASE_URL_ENV: &str = "ROTARR_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Resolved server base URL: environment override, then config, then
    /// the local default.
    pub fn resolved_base_url(&self) -> String {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                return url;
            }
        }
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory backing the persistent storage (credentials and response
    /// cache).
    pub fn storage_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
