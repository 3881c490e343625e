use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "rollcall.toml";

/// Env var that overrides `client.api_url`.
pub const API_URL_ENV: &str = "ROLLCALL_API_URL";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RollcallConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// The backend drives a real browser per account, so this is generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_accounts_file() -> String {
    format!("{}.json", crate::account::STORAGE_KEY)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            accounts_file: default_accounts_file(),
        }
    }
}

impl Default for RollcallConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl RollcallConfig {
    /// Loads the config at `path`. A missing file is created with defaults;
    /// an unreadable or unparseable one falls back to defaults.
    pub fn load_or_default(path: &str) -> Self {
        if Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        warn!("Error parsing config {}: {}. Using defaults.", path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config {}: {}. Using defaults.", path, e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            match toml::to_string_pretty(&config) {
                Ok(s) => {
                    if let Err(e) = std::fs::write(path, s) {
                        warn!("Could not write default config to {}: {}", path, e);
                    }
                }
                Err(e) => warn!("Could not serialize default config: {}", e),
            }
            config
        }
    }

    /// Applies `ROLLCALL_API_URL` if it is set and non-blank.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.apply_api_url(&url);
        }
    }

    pub fn apply_api_url(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.client.api_url = url.to_string();
        }
    }

    /// Full URL of the check-in endpoint.
    pub fn rollcall_endpoint(&self) -> String {
        format!("{}/rollcall/", self.client.api_url.trim_end_matches('/'))
    }
}
