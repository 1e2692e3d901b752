//! Service connection configuration.
//!
//! Supports configuration via environment variables:
//! - `ODOO_URL`: Base URL of the service (http or https)
//! - `ODOO_DB`: Database name
//! - `ODOO_LOGIN`: Login of the user to authenticate as
//! - `ODOO_PASSWORD`: Password or API key

use std::env;
use std::fmt;

use url::Url;

use crate::transport::{TransportError, TransportResult};

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Everything needed to reach and authenticate against one database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL, e.g. `https://erp.example.com`.
    pub url: String,
    /// Database name on the server.
    pub database: String,
    /// Login of the user to authenticate as.
    pub login: String,
    /// Password or API key.
    pub password: String,
}

impl ConnectionConfig {
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            login: login.into(),
            password: password.into(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// All four of `ODOO_URL`, `ODOO_DB`, `ODOO_LOGIN` and `ODOO_PASSWORD`
    /// are required.
    pub fn from_env() -> Result<Self, ConnectionError> {
        let var = |name: &str| {
            env::var(name).map_err(|_| ConnectionError::MissingEnvVar(name.to_string()))
        };

        let config = Self::new(
            var("ODOO_URL")?,
            var("ODOO_DB")?,
            var("ODOO_LOGIN")?,
            var("ODOO_PASSWORD")?,
        );
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is present.
    pub fn validate(&self) -> Result<(), ConnectionError> {
        for (name, value) in [
            ("url", &self.url),
            ("database", &self.database),
            ("login", &self.login),
        ] {
            if value.trim().is_empty() {
                return Err(ConnectionError::InvalidConfig(format!("{name} is empty")));
            }
        }
        Ok(())
    }

    /// Parse the base URL.
    ///
    /// The scheme must be `http` or `https`. The returned URL always ends
    /// with `/` so endpoint paths can be joined onto it.
    pub fn base_url(&self) -> TransportResult<Url> {
        let mut url = Url::parse(self.url.trim())
            .map_err(|e| TransportError::MalformedUrl(format!("{}: {e}", self.url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(TransportError::MalformedUrl(format!(
                "{}: scheme must be http or https",
                self.url
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}
