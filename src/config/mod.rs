//! Configuration module.
//!
//! Handles connection configuration, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError};
pub use settings::{
    expand_env_vars, ConnectionSettings, Settings, SettingsError, TransportSettings,
    CONFIG_ENV_VAR,
};
