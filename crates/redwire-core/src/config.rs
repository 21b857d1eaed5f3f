//! Configuration schema (redwire.toml)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection parameters for a warehouse client
///
/// Every field is optional. When `url` is set it takes precedence over the
/// discrete address fields; `driver` and `schema` apply either way.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub database: Option<String>,

    /// Full connection URL, overrides the address fields
    #[serde(default)]
    pub url: Option<String>,

    /// Low-level driver name
    #[serde(default)]
    pub driver: Option<String>,

    /// Default schema for table lookups
    #[serde(default)]
    pub schema: Option<String>,
}

impl ConnectParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters that only carry an explicit URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Overlay `other` on top of `self`; fields set in `other` win
    pub fn overlay(self, other: ConnectParams) -> Self {
        Self {
            host: other.host.or(self.host),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            port: other.port.or(self.port),
            database: other.database.or(self.database),
            url: other.url.or(self.url),
            driver: other.driver.or(self.driver),
            schema: other.schema.or(self.schema),
        }
    }
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("port", &self.port)
            .field("database", &self.database)
            .field("url", &self.url.as_ref().map(|_| "<set>"))
            .field("driver", &self.driver)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Warehouse connection settings
    #[serde(default)]
    pub connection: ConnectParams,

    /// Mask passwords when connection URLs are printed or logged
    #[serde(default = "default_redact_credentials")]
    pub redact_credentials: bool,
}

fn default_redact_credentials() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectParams::default(),
            redact_credentials: true,
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
