//! TOML-based configuration.
//!
//! Supports a config file (odoo-rpc.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [connections.production]
//! url = "https://erp.example.com"
//! database = "prod"
//! login = "integration@example.com"
//! password = "${ODOO_PROD_API_KEY}"
//!
//! [connections.local]
//! url = "http://localhost:8069"
//! database = "dev"
//! login = "admin"
//! password = "admin"
//!
//! [transport]
//! timeout_secs = 60
//!
//! [resolution]
//! on_missing_match = "fail"
//! on_ambiguous_metadata = "reject"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::connection::ConnectionConfig;
use crate::relation::ResolutionPolicy;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ODOO_RPC_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("No connections configured")]
    NoConnections,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named service connections.
    pub connections: BTreeMap<String, ConnectionSettings>,

    /// HTTP transport configuration.
    pub transport: TransportSettings,

    /// Relation resolution behavior.
    pub resolution: ResolutionPolicy,
}

/// One `[connections.<name>]` table.
///
/// Every value supports `${VAR}` expansion.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    pub url: String,
    pub database: String,
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl ConnectionSettings {
    /// Expand environment variables and build a [`ConnectionConfig`].
    pub fn resolve(&self) -> Result<ConnectionConfig, SettingsError> {
        Ok(ConnectionConfig::new(
            expand_env_vars(&self.url)?,
            expand_env_vars(&self.database)?,
            expand_env_vars(&self.login)?,
            expand_env_vars(&self.password)?,
        ))
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl TransportSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `ODOO_RPC_CONFIG`
    /// 2. `./odoo-rpc.toml`
    /// 3. `<config dir>/odoo-rpc/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("odoo-rpc.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("odoo-rpc").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, else the first by name).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a named connection, or the default one when `name` is `None`.
    pub fn connection_config(&self, name: Option<&str>) -> Result<ConnectionConfig, SettingsError> {
        let settings = match name {
            Some(name) => self.get_connection(name)?,
            None => self.default_connection().ok_or(SettingsError::NoConnections)?.1,
        };
        settings.resolve()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut name = String::new();
        while let Some(&ch) = chars.peek() {
            if braced && ch == '}' {
                chars.next();
                break;
            }
            if !braced && !(ch.is_alphanumeric() || ch == '_') {
                break;
            }
            name.push(ch);
            chars.next();
        }

        if name.is_empty() && !braced {
            result.push('$');
            continue;
        }

        let value = env::var(&name).map_err(|_| SettingsError::MissingEnvVar(name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
