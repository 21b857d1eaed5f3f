//! Capability traits the client uses to reach a warehouse

use crate::url::ConnectionUrl;
use redwire_core::Schema;

/// Text-valued rows returned by a raw catalog query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    /// Column names in result order
    pub columns: Vec<String>,

    /// Row values, `None` for SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).and_then(|v| v.as_deref()))
                .collect(),
        )
    }
}

/// Errors raised by the client and its backends
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("TLS error: {0}")]
    Tls(String),

    /// Error reported by the PostgreSQL driver, passed through untouched
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),
}

/// An open warehouse connection
///
/// Each call performs its own round-trip; implementations do not cache.
#[async_trait::async_trait]
pub trait Connection: Send + Sync {
    /// Run a raw SQL query and return its rows as text
    async fn execute(&self, query: &str) -> Result<RowSet, ClientError>;

    /// Names of the tables in `schema`, in catalog order
    async fn table_names(&self, schema: &str) -> Result<Vec<String>, ClientError>;

    /// Load the column layout of `schema.name` from the live catalog
    async fn reflect_table(&self, name: &str, schema: &str) -> Result<Schema, ClientError>;

    /// Release the connection; later calls fail
    async fn close(&self);
}

/// Opens connections for a client
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    /// Backend name (e.g., "PostgreSQL", "Mock")
    fn name(&self) -> &'static str;

    /// Open one connection to the warehouse at `url`
    async fn connect(&self, url: &ConnectionUrl) -> Result<Self::Connection, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_set_column_lookup() {
        let rows = RowSet::new(
            vec!["datname".to_string(), "owner".to_string()],
            vec![
                vec![Some("dev".to_string()), Some("rdsdb".to_string())],
                vec![Some("prod".to_string()), None],
            ],
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows.column("datname").unwrap(), vec![Some("dev"), Some("prod")]);
        assert_eq!(rows.column("owner").unwrap(), vec![Some("rdsdb"), None]);
        assert!(rows.column("missing").is_none());
        assert!(RowSet::default().is_empty());
    }

    #[test]
    fn error_messages() {
        let err = ClientError::NotImplemented("other".to_string());
        assert_eq!(err.to_string(), "Not implemented: other");

        let err = ClientError::TableNotFound("public.orders".to_string());
        assert_eq!(err.to_string(), "Table not found: public.orders");
    }
}
