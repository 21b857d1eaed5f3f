//! Mock warehouse backend for testing
//!
//! Keeps a small catalog in memory and answers the same calls a live
//! Redshift connection would, without any network. It's useful for:
//! - Unit testing code built on [`RedshiftClient`](crate::RedshiftClient)
//! - Counting catalog round-trips (reflection is never cached)
//! - Simulating connection and query failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use redwire_catalog::{MockCatalogBuilder, RedshiftClient};
//! use redwire_core::{Column, ConnectParams, LogicalType, Schema};
//!
//! let connector = MockCatalogBuilder::new()
//!     .with_database("dev")
//!     .with_table("public", "orders", Schema::from_columns(vec![
//!         Column::new("id", LogicalType::Int),
//!     ]))
//!     .build();
//!
//! let client = RedshiftClient::connect_with(&connector, &ConnectParams::new().with_host("h")).await?;
//! let orders = client.table("orders", None).await?;
//! assert_eq!(connector.reflect_calls(), 1);
//! ```

use crate::adapter::{ClientError, Connection, Connector, RowSet};
use crate::client::LIST_DATABASES_QUERY;
use crate::url::ConnectionUrl;
use redwire_core::Schema;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory catalog contents
#[derive(Default)]
struct MockCatalog {
    /// Databases in server order, with their template flag
    databases: Vec<(String, bool)>,

    /// Tables per schema, in catalog order
    tables: HashMap<String, Vec<(String, Schema)>>,

    /// Raw queries seen by `execute`
    executed: Vec<String>,

    /// URLs passed to `connect`
    urls: Vec<String>,

    /// Message returned by every query when set
    query_failure: Option<String>,
}

/// Round-trip counters shared by a connector and its connections
#[derive(Default)]
struct CallCounts {
    connect: AtomicUsize,
    execute: AtomicUsize,
    table_names: AtomicUsize,
    reflect: AtomicUsize,
    close: AtomicUsize,
}

/// Mock connector
///
/// Clones share the same catalog and counters.
#[derive(Clone)]
pub struct MockConnector {
    catalog: Arc<RwLock<MockCatalog>>,
    calls: Arc<CallCounts>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate per-call latency (milliseconds)
    latency_ms: u64,
}

impl MockConnector {
    /// Create a connector with an empty catalog
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(RwLock::new(MockCatalog::default())),
            calls: Arc::new(CallCounts::default()),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Add a regular database
    pub async fn add_database(&self, name: &str) {
        self.catalog.write().await.databases.push((name.to_string(), false));
    }

    /// Add a template database (hidden from database listings)
    pub async fn add_template_database(&self, name: &str) {
        self.catalog.write().await.databases.push((name.to_string(), true));
    }

    /// Add a table to `schema`, after any tables already there
    pub async fn add_table(&self, schema: &str, name: &str, columns: Schema) {
        self.catalog
            .write()
            .await
            .tables
            .entry(schema.to_string())
            .or_default()
            .push((name.to_string(), columns));
    }

    /// Remove a table; later reflections of it fail
    pub async fn remove_table(&self, schema: &str, name: &str) {
        if let Some(tables) = self.catalog.write().await.tables.get_mut(schema) {
            tables.retain(|(table, _)| table != name);
        }
    }

    /// Fail every `connect` call
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Delay every call by `latency_ms` milliseconds
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Make every subsequent query fail with `message`
    pub async fn fail_queries(&self, message: &str) {
        self.catalog.write().await.query_failure = Some(message.to_string());
    }

    pub fn connect_calls(&self) -> usize {
        self.calls.connect.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.calls.execute.load(Ordering::SeqCst)
    }

    pub fn table_names_calls(&self) -> usize {
        self.calls.table_names.load(Ordering::SeqCst)
    }

    pub fn reflect_calls(&self) -> usize {
        self.calls.reflect.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.calls.close.load(Ordering::SeqCst)
    }

    /// Raw queries executed so far, in order
    pub async fn executed_queries(&self) -> Vec<String> {
        self.catalog.read().await.executed.clone()
    }

    /// URLs passed to `connect` so far, in order
    pub async fn connected_urls(&self) -> Vec<String> {
        self.catalog.read().await.urls.clone()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn connect(&self, url: &ConnectionUrl) -> Result<MockConnection, ClientError> {
        simulate_latency(self.latency_ms).await;
        self.calls.connect.fetch_add(1, Ordering::SeqCst);
        self.catalog.write().await.urls.push(url.as_str().to_string());

        if self.fail_connection {
            return Err(ClientError::Connection(format!(
                "Simulated connection failure to {}",
                url
            )));
        }

        Ok(MockConnection {
            catalog: Arc::clone(&self.catalog),
            calls: Arc::clone(&self.calls),
            latency_ms: self.latency_ms,
            closed: AtomicBool::new(false),
        })
    }
}

/// Connection handed out by [`MockConnector`]
pub struct MockConnection {
    catalog: Arc<RwLock<MockCatalog>>,
    calls: Arc<CallCounts>,
    latency_ms: u64,
    closed: AtomicBool,
}

impl MockConnection {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Common checks before answering a call
    async fn begin(&self) -> Result<(), ClientError> {
        simulate_latency(self.latency_ms).await;

        if self.is_closed() {
            return Err(ClientError::Connection("connection is closed".to_string()));
        }
        if let Some(message) = &self.catalog.read().await.query_failure {
            return Err(ClientError::Query(message.clone()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Connection for MockConnection {
    async fn execute(&self, query: &str) -> Result<RowSet, ClientError> {
        self.calls.execute.fetch_add(1, Ordering::SeqCst);
        self.catalog.write().await.executed.push(query.to_string());
        self.begin().await?;

        if normalize(query) != normalize(LIST_DATABASES_QUERY) {
            return Err(ClientError::Query(format!("Mock cannot answer query: {}", query)));
        }

        let catalog = self.catalog.read().await;
        let rows = catalog
            .databases
            .iter()
            .filter(|(_, is_template)| !is_template)
            .map(|(name, _)| vec![Some(name.clone())])
            .collect();

        Ok(RowSet::new(vec!["datname".to_string()], rows))
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>, ClientError> {
        self.calls.table_names.fetch_add(1, Ordering::SeqCst);
        self.begin().await?;

        let catalog = self.catalog.read().await;
        Ok(catalog
            .tables
            .get(schema)
            .map(|tables| tables.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default())
    }

    async fn reflect_table(&self, name: &str, schema: &str) -> Result<Schema, ClientError> {
        self.calls.reflect.fetch_add(1, Ordering::SeqCst);
        self.begin().await?;

        let catalog = self.catalog.read().await;
        catalog
            .tables
            .get(schema)
            .and_then(|tables| tables.iter().find(|(table, _)| table == name))
            .map(|(_, columns)| columns.clone())
            .ok_or_else(|| ClientError::TableNotFound(format!("{}.{}", schema, name)))
    }

    async fn close(&self) {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

async fn simulate_latency(latency_ms: u64) {
    if latency_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(latency_ms)).await;
    }
}

/// Builder for a [`MockConnector`] with a predefined catalog
///
/// # Example
///
/// ```rust,ignore
/// let connector = MockCatalogBuilder::new()
///     .with_database("dev")
///     .with_template_database("template1")
///     .with_table("public", "users", users_schema)
///     .with_table("public", "orders", orders_schema)
///     .with_latency(50)
///     .build();
/// ```
pub struct MockCatalogBuilder {
    catalog: MockCatalog,
    fail_connection: bool,
    latency_ms: u64,
}

impl MockCatalogBuilder {
    pub fn new() -> Self {
        Self {
            catalog: MockCatalog::default(),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    pub fn with_database(mut self, name: &str) -> Self {
        self.catalog.databases.push((name.to_string(), false));
        self
    }

    pub fn with_template_database(mut self, name: &str) -> Self {
        self.catalog.databases.push((name.to_string(), true));
        self
    }

    /// Add a table; tables keep the order they were added in
    pub fn with_table(mut self, schema: &str, name: &str, columns: Schema) -> Self {
        self.catalog
            .tables
            .entry(schema.to_string())
            .or_default()
            .push((name.to_string(), columns));
        self
    }

    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn build(self) -> MockConnector {
        MockConnector {
            catalog: Arc::new(RwLock::new(self.catalog)),
            calls: Arc::new(CallCounts::default()),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
        }
    }
}

impl Default for MockCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redwire_core::{Column, LogicalType};

    fn url() -> ConnectionUrl {
        ConnectionUrl::parse("postgresql://u@h:5439/dev").unwrap()
    }

    #[tokio::test]
    async fn test_mock_lists_non_template_databases() {
        let connector = MockCatalogBuilder::new()
            .with_database("prod")
            .with_template_database("template0")
            .with_database("dev")
            .with_database("analytics")
            .build();
        let con = connector.connect(&url()).await.unwrap();

        let rows = con.execute(LIST_DATABASES_QUERY).await.unwrap();
        assert_eq!(
            rows.column("datname").unwrap(),
            vec![Some("prod"), Some("dev"), Some("analytics")]
        );
        assert_eq!(connector.execute_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_rejects_unknown_queries() {
        let connector = MockConnector::new();
        let con = connector.connect(&url()).await.unwrap();

        let result = con.execute("SELECT 1").await;
        assert!(matches!(result, Err(ClientError::Query(_))));
        assert_eq!(connector.executed_queries().await, vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn test_mock_table_names_keep_insertion_order() {
        let connector = MockConnector::new();
        let schema = Schema::from_columns(vec![Column::new("id", LogicalType::Int)]);
        connector.add_table("public", "b", schema.clone()).await;
        connector.add_table("public", "a", schema.clone()).await;
        connector.add_table("other", "c", schema).await;

        let con = connector.connect(&url()).await.unwrap();
        assert_eq!(con.table_names("public").await.unwrap(), vec!["b", "a"]);
        assert_eq!(con.table_names("other").await.unwrap(), vec!["c"]);
        assert!(con.table_names("missing").await.unwrap().is_empty());
        assert_eq!(connector.table_names_calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_reflect_and_remove() {
        let connector = MockConnector::new();
        connector
            .add_table(
                "public",
                "users",
                Schema::from_columns(vec![Column::new("id", LogicalType::Int)]),
            )
            .await;
        let con = connector.connect(&url()).await.unwrap();

        assert_eq!(con.reflect_table("users", "public").await.unwrap().len(), 1);

        connector.remove_table("public", "users").await;
        let result = con.reflect_table("users", "public").await;
        assert!(matches!(result, Err(ClientError::TableNotFound(t)) if t == "public.users"));
        assert_eq!(connector.reflect_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_connection_failure() {
        let connector = MockConnector::new().with_connection_failure();
        let result = connector.connect(&url()).await;
        assert!(matches!(result, Err(ClientError::Connection(_))));
        assert_eq!(connector.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_query_failure() {
        let connector = MockConnector::new();
        let con = connector.connect(&url()).await.unwrap();
        connector.fail_queries("relation does not exist").await;

        let result = con.table_names("public").await;
        assert!(matches!(result, Err(ClientError::Query(m)) if m == "relation does not exist"));
    }

    #[tokio::test]
    async fn test_mock_closed_connection() {
        let connector = MockConnector::new();
        let con = connector.connect(&url()).await.unwrap();
        con.close().await;

        assert!(con.is_closed());
        assert_eq!(connector.close_calls(), 1);
        assert!(matches!(
            con.table_names("public").await,
            Err(ClientError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let connector = MockConnector::new();
        let cloned = connector.clone();

        let _con = cloned.connect(&url()).await.unwrap();
        assert_eq!(connector.connect_calls(), 1);
        assert_eq!(connector.connected_urls().await, vec!["postgresql://u@h:5439/dev"]);
    }
}
