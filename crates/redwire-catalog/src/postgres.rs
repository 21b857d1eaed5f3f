//! PostgreSQL wire backend for Redshift
//!
//! Redshift speaks the PostgreSQL frontend/backend protocol, so connections
//! are opened with tokio-postgres. Catalog lookups go through `pg_class` /
//! `pg_namespace` for table names and `information_schema.columns` for
//! table layouts; both exist on Redshift and on stock PostgreSQL.
//!
//! ## TLS
//!
//! Redshift clusters usually require SSL. Build with the `tls` feature and
//! use [`PostgresConnector::with_tls`]:
//!
//! ```rust,ignore
//! let client = RedshiftClient::connect_with(&PostgresConnector::with_tls(), &params).await?;
//! ```
//!
//! Reference: https://docs.aws.amazon.com/redshift/latest/dg/c_Supported_data_types.html

use crate::adapter::{ClientError, Connection, Connector, RowSet};
use crate::url::ConnectionUrl;
use redwire_core::{Column, LogicalType, Nullability, Schema};
use std::future::Future;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

const TABLE_NAMES_QUERY: &str = r#"
    SELECT c.relname::text
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1
      AND c.relkind IN ('r', 'p')
"#;

const REFLECT_TABLE_QUERY: &str = r#"
    SELECT
        column_name::text,
        data_type::text,
        is_nullable::text,
        numeric_precision::int4,
        numeric_scale::int4,
        udt_name::text,
        character_maximum_length::int4
    FROM information_schema.columns
    WHERE table_schema = $1
      AND table_name = $2
    ORDER BY ordinal_position
"#;

/// Opens tokio-postgres connections
#[derive(Debug, Clone, Default)]
pub struct PostgresConnector {
    tls: bool,
}

impl PostgresConnector {
    /// Plain (non-TLS) connections
    pub fn new() -> Self {
        Self { tls: false }
    }

    /// TLS connections via native-tls; needs the `tls` feature
    pub fn with_tls() -> Self {
        Self { tls: true }
    }

    #[cfg(feature = "tls")]
    async fn connect_tls(&self, url: &ConnectionUrl) -> Result<PostgresConnection, ClientError> {
        let connector = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| ClientError::Tls(format!("Failed to create TLS connector: {}", e)))?;
        let tls = postgres_native_tls::MakeTlsConnector::new(connector);

        let (client, connection) = url.pg_config().connect(tls).await?;
        let driver = spawn_driver(connection, url.redacted());

        Ok(PostgresConnection::new(client, driver))
    }

    #[cfg(not(feature = "tls"))]
    async fn connect_tls(&self, _url: &ConnectionUrl) -> Result<PostgresConnection, ClientError> {
        Err(ClientError::Tls(
            "TLS support not compiled. Rebuild with: cargo build --features tls".to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl Connector for PostgresConnector {
    type Connection = PostgresConnection;

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn connect(&self, url: &ConnectionUrl) -> Result<PostgresConnection, ClientError> {
        if self.tls {
            return self.connect_tls(url).await;
        }

        let (client, connection) = url.pg_config().connect(NoTls).await?;
        let driver = spawn_driver(connection, url.redacted());

        Ok(PostgresConnection::new(client, driver))
    }
}

/// Drive the connection's socket in the background until it closes
fn spawn_driver<F>(connection: F, address: String) -> JoinHandle<()>
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(url = %address, error = %e, "warehouse connection closed with error");
        }
    })
}

/// A live tokio-postgres connection
///
/// `close` drops the `Client` (the server receives Terminate) and waits for
/// the driver task to finish. Later calls fail with a connection error.
pub struct PostgresConnection {
    client: RwLock<Option<Client>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl PostgresConnection {
    fn new(client: Client, driver: JoinHandle<()>) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            driver: Mutex::new(Some(driver)),
        }
    }

    /// Whether `close` has run
    pub async fn is_closed(&self) -> bool {
        self.client.read().await.is_none()
    }

    /// Convert a warehouse type name to a LogicalType
    ///
    /// Covers the Redshift type set plus the PostgreSQL types that show up
    /// when the same code points at a plain Postgres server.
    ///
    /// # Supported Types
    ///
    /// - **Boolean**: `boolean`, `bool`
    /// - **Integer**: `smallint`, `integer`, `bigint` and aliases
    /// - **Floating Point**: `real`, `double precision`
    /// - **Numeric**: `numeric(p,s)`, `decimal(p,s)`, `money`
    /// - **String**: `varchar`, `char`, `bpchar`, `text`, `name`
    /// - **Binary**: `varbyte`, `varbinary`, `bytea`, `hllsketch`
    /// - **Date/Time**: `date`, `timestamp`, `timestamptz`, `time`, `timetz`
    /// - **Semi-structured**: `super`, `json`, `jsonb`
    /// - **Spatial**: `geometry`, `geography`
    /// - **Array**: `type[]` and `_type` notation
    pub fn map_redshift_type(type_name: &str) -> LogicalType {
        let base_type = type_name
            .split('(')
            .next()
            .unwrap_or(type_name)
            .trim()
            .to_lowercase();

        match base_type.as_str() {
            "boolean" | "bool" => LogicalType::Bool,

            "smallint" | "int2" | "integer" | "int" | "int4" | "bigint" | "int8" => LogicalType::Int,
            "serial" | "serial4" | "bigserial" | "serial8" | "smallserial" | "serial2" => {
                LogicalType::Int
            }
            "oid" => LogicalType::Int,

            "real" | "float4" => LogicalType::Float,
            "double precision" | "float8" | "float" => LogicalType::Float,

            "numeric" | "decimal" => Self::parse_numeric_type(type_name),
            "money" => LogicalType::Decimal {
                precision: Some(19),
                scale: Some(2),
            },

            "character varying" | "varchar" | "nvarchar" => LogicalType::String,
            "character" | "char" | "bpchar" | "nchar" => LogicalType::String,
            "text" | "name" | "citext" | "uuid" | "xml" | "interval" => LogicalType::String,

            "varbyte" | "varbinary" | "binary varying" | "bytea" | "hllsketch" => {
                LogicalType::Binary
            }

            "date" => LogicalType::Date,
            "timestamp without time zone" | "timestamp" => LogicalType::Timestamp,
            "timestamp with time zone" | "timestamptz" => LogicalType::Timestamp,
            "time without time zone" | "time" => LogicalType::Timestamp,
            "time with time zone" | "timetz" => LogicalType::Timestamp,

            "super" | "json" | "jsonb" => LogicalType::Json,

            "geometry" | "geography" => LogicalType::Geometry,

            "array" => LogicalType::Array {
                element_type: Box::new(LogicalType::Unknown),
            },

            _ => {
                if let Some(element) = type_name.strip_suffix("[]") {
                    LogicalType::Array {
                        element_type: Box::new(Self::map_redshift_type(element)),
                    }
                } else if let Some(element) = type_name.strip_prefix('_') {
                    LogicalType::Array {
                        element_type: Box::new(Self::map_redshift_type(element)),
                    }
                } else {
                    LogicalType::Unknown
                }
            }
        }
    }

    /// Parse numeric type with precision and scale
    ///
    /// `numeric` has arbitrary precision, `numeric(10)` has scale 0.
    fn parse_numeric_type(type_str: &str) -> LogicalType {
        if let Some(params) = type_str.split('(').nth(1) {
            if let Some(params) = params.strip_suffix(')') {
                let parts: Vec<&str> = params.split(',').collect();
                if parts.len() == 2 {
                    let precision = parts[0].trim().parse().ok();
                    let scale = parts[1].trim().parse().ok();
                    return LogicalType::Decimal { precision, scale };
                } else if parts.len() == 1 {
                    let precision = parts[0].trim().parse().ok();
                    return LogicalType::Decimal { precision, scale: Some(0) };
                }
            }
        }

        LogicalType::Decimal {
            precision: None,
            scale: None,
        }
    }

    /// Reassemble the full type string from `information_schema` parts
    fn full_type_name(
        data_type: &str,
        udt_name: &str,
        precision: Option<i32>,
        scale: Option<i32>,
        max_length: Option<i32>,
    ) -> String {
        match data_type {
            "numeric" | "decimal" => match (precision, scale) {
                (Some(p), Some(s)) => format!("numeric({},{})", p, s),
                (Some(p), None) => format!("numeric({})", p),
                _ => data_type.to_string(),
            },
            "character varying" | "character" => match max_length {
                Some(len) => format!("{}({})", data_type, len),
                None => data_type.to_string(),
            },
            "ARRAY" => match udt_name.strip_prefix('_') {
                Some(element) => format!("{}[]", element),
                None => data_type.to_string(),
            },
            "USER-DEFINED" => udt_name.to_string(),
            _ => data_type.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Connection for PostgresConnection {
    async fn execute(&self, query: &str) -> Result<RowSet, ClientError> {
        let guard = self.client.read().await;
        let messages = open_client(&guard)?.simple_query(query).await?;

        let mut result = RowSet::default();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                if result.columns.is_empty() {
                    result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                let mut values = Vec::with_capacity(row.len());
                for idx in 0..row.len() {
                    values.push(row.try_get(idx)?.map(str::to_string));
                }
                result.rows.push(values);
            }
        }

        Ok(result)
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>, ClientError> {
        let guard = self.client.read().await;
        let rows = open_client(&guard)?.query(TABLE_NAMES_QUERY, &[&schema]).await?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(ClientError::from))
            .collect()
    }

    async fn reflect_table(&self, name: &str, schema: &str) -> Result<Schema, ClientError> {
        let guard = self.client.read().await;
        let rows = open_client(&guard)?
            .query(REFLECT_TABLE_QUERY, &[&schema, &name])
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let column_name: String = row.try_get(0)?;
            let data_type: String = row.try_get(1)?;
            let is_nullable: String = row.try_get(2)?;
            let precision: Option<i32> = row.try_get(3)?;
            let scale: Option<i32> = row.try_get(4)?;
            let udt_name: String = row.try_get(5)?;
            let max_length: Option<i32> = row.try_get(6)?;

            let full_type = Self::full_type_name(&data_type, &udt_name, precision, scale, max_length);
            let logical_type = Self::map_redshift_type(&full_type);

            columns.push(
                Column::new(column_name, logical_type)
                    .with_nullability(Nullability::from_is_nullable(&is_nullable))
                    .with_native_type(full_type),
            );
        }

        if columns.is_empty() {
            return Err(ClientError::TableNotFound(format!("{}.{}", schema, name)));
        }

        Ok(Schema::from_columns(columns))
    }

    async fn close(&self) {
        // Dropping the client sends Terminate and ends the driver future
        drop(self.client.write().await.take());

        if let Some(driver) = self.driver.lock().await.take() {
            if let Err(e) = driver.await {
                tracing::warn!(error = %e, "connection driver task did not finish cleanly");
            }
        }
    }
}

fn open_client(client: &Option<Client>) -> Result<&Client, ClientError> {
    client
        .as_ref()
        .ok_or_else(|| ClientError::Connection("connection is closed".to_string()))
}
