//! Connection URL construction and parsing
//!
//! Redshift is reached through the PostgreSQL wire protocol, so every URL
//! produced here uses the `postgresql` scheme. The discrete address fields
//! are joined as `[user[:password]@]host[:port][/database]`, each segment
//! left out when its value is absent.

use crate::adapter::ClientError;
use redwire_core::ConnectParams;
use std::fmt;

/// The only low-level driver name accepted in connection parameters
pub const SUPPORTED_DRIVER: &str = "psycopg2";

/// Schema used when none is configured
pub const DEFAULT_SCHEMA: &str = "public";

const SCHEME: &str = "postgresql";

/// A validated PostgreSQL connection URL
#[derive(Clone)]
pub struct ConnectionUrl {
    raw: String,
    config: tokio_postgres::Config,
}

impl ConnectionUrl {
    /// Build the URL from connection parameters
    ///
    /// An explicit `url` wins over the address fields and the `driver` field.
    /// Otherwise a `driver` other than [`SUPPORTED_DRIVER`] is rejected before
    /// the address is built.
    pub fn from_params(params: &ConnectParams) -> Result<Self, ClientError> {
        match &params.url {
            Some(url) => Self::parse(url),
            None => {
                if let Some(driver) = &params.driver {
                    check_driver(driver)?;
                }
                Self::parse(&format!("{}://{}", SCHEME, build_address(params)))
            }
        }
    }

    /// Parse and validate a full connection URL
    ///
    /// `postgres://` is accepted as an alias, and a `+psycopg2` driver suffix
    /// on the scheme is stripped.
    pub fn parse(url: &str) -> Result<Self, ClientError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ClientError::InvalidUrl(format!("missing scheme in '{}'", redact(url))))?;

        let (base, driver) = match scheme.split_once('+') {
            Some((base, driver)) => (base, Some(driver)),
            None => (scheme, None),
        };

        if base != "postgresql" && base != "postgres" {
            return Err(ClientError::InvalidUrl(format!(
                "unsupported scheme '{}', expected {}://",
                scheme, SCHEME
            )));
        }

        if let Some(driver) = driver {
            check_driver(driver)?;
        }

        let raw = format!("{}://{}", SCHEME, rest);
        let config: tokio_postgres::Config = raw
            .parse()
            .map_err(|e: tokio_postgres::Error| ClientError::InvalidUrl(e.to_string()))?;

        Ok(Self { raw, config })
    }

    /// The URL as it will be used to connect, credentials included
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Database named by the URL, if any
    pub fn database(&self) -> Option<&str> {
        self.config.get_dbname()
    }

    /// Driver configuration parsed from the URL
    pub fn pg_config(&self) -> &tokio_postgres::Config {
        &self.config
    }

    /// The URL with its password masked, safe for logs
    pub fn redacted(&self) -> String {
        redact(&self.raw)
    }
}

impl fmt::Display for ConnectionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ConnectionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionUrl").field(&self.redacted()).finish()
    }
}

fn check_driver(driver: &str) -> Result<(), ClientError> {
    if driver == SUPPORTED_DRIVER {
        Ok(())
    } else {
        Err(ClientError::NotImplemented(driver.to_string()))
    }
}

/// Join the address segments in order, skipping the absent ones
fn build_address(params: &ConnectParams) -> String {
    let mut address = String::new();

    if let Some(user) = &params.user {
        address.push_str(user);
        if let Some(password) = &params.password {
            address.push(':');
            address.push_str(password);
        }
        address.push('@');
    }

    if let Some(host) = &params.host {
        address.push_str(host);
    }

    if let Some(port) = params.port {
        address.push(':');
        address.push_str(&port.to_string());
    }

    if let Some(database) = &params.database {
        address.push('/');
        address.push_str(database);
    }

    address
}

fn redact(url: &str) -> String {
    match ::url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("****"));
            }
            parsed.to_string()
        }
        Err(_) => "<redacted>".to_string(),
    }
}
