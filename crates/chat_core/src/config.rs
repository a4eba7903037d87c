use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::paths::{config_json_path, config_toml_path};

/// Backend access tokens live for 29 minutes.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: u64 = 29 * 60;
/// Backend refresh tokens (and therefore the whole session) live for a day.
pub const DEFAULT_REFRESH_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend API (login, refresh, signout, response).
    pub backend_url: String,
    /// Public URL of the frontend itself.
    pub app_url: String,
    pub access_token_lifetime_secs: u64,
    pub refresh_token_lifetime_secs: u64,
    pub request_timeout_secs: u64,
    /// Transient-failure retries for backend calls. Zero disables the retry middleware.
    pub max_retries: u32,
    pub http_proxy: String,
    pub https_proxy: String,
    pub http_proxy_auth: Option<ProxyAuth>,
    pub https_proxy_auth: Option<ProxyAuth>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            access_token_lifetime_secs: DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
            refresh_token_lifetime_secs: DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: 0,
            http_proxy: String::new(),
            https_proxy: String::new(),
            http_proxy_auth: None,
            https_proxy_auth: None,
        }
    }
}

impl Config {
    /// Load the effective configuration: user config.json, else ./config.toml,
    /// then environment overrides. Unreadable files fall back to defaults.
    pub fn new() -> Self {
        let mut config = Self::load_from(&config_json_path(), &config_toml_path());
        config.apply_env();
        config
    }

    /// Load from the given files without looking at the environment.
    /// The JSON file wins when both exist.
    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match Self::from_json_file(json_path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config file: {e}"),
            }
        }

        if toml_path.exists() {
            match Self::from_toml_file(toml_path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config file: {e}"),
            }
        }

        debug!("No config file found, using defaults");
        Config::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides through `lookup`. Numeric values that do
    /// not parse are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(url) = lookup("APP_URL").or_else(|| lookup("NEXTAUTH_URL")) {
            self.app_url = url;
        }
        if let Some(secs) = parse_number(&lookup, "BACKEND_ACCESS_TOKEN_LIFETIME") {
            self.access_token_lifetime_secs = secs;
        }
        if let Some(secs) = parse_number(&lookup, "BACKEND_REFRESH_TOKEN_LIFETIME") {
            self.refresh_token_lifetime_secs = secs;
        }
        if let Some(secs) = parse_number(&lookup, "BACKEND_REQUEST_TIMEOUT") {
            self.request_timeout_secs = secs;
        }
        if let Some(retries) = parse_number(&lookup, "BACKEND_MAX_RETRIES") {
            self.max_retries = retries;
        }
        if let Some(proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = proxy;
        }
        if let Some(proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = proxy;
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {key}={raw:?}: not a number");
            None
        }
    }
}
