//! The Redshift client
//!
//! [`RedshiftClient`] owns exactly one warehouse connection for its whole
//! life. Every catalog method issues its round-trip(s) through that
//! connection and returns once they complete; nothing is cached, retried or
//! re-wrapped, so driver errors reach the caller as the driver raised them.

use crate::adapter::{ClientError, Connection, Connector};
use crate::postgres::{PostgresConnection, PostgresConnector};
use crate::table::{RedshiftDatabase, RedshiftTable};
use crate::url::{ConnectionUrl, DEFAULT_SCHEMA};
use redwire_core::{ConnectParams, Database, Schema, TableExpr, TableNode};
use std::fmt;

/// Catalog query listing every non-template database
///
/// Reference: http://dba.stackexchange.com/a/1304/58517
pub const LIST_DATABASES_QUERY: &str = "SELECT datname FROM pg_database WHERE NOT datistemplate";

/// Client for one Redshift database
pub struct RedshiftClient<C: Connection = PostgresConnection> {
    /// Database named in the connection URL
    name: Option<String>,

    /// Schema used when a call does not name one
    schema: String,

    url: ConnectionUrl,

    con: C,
}

impl RedshiftClient<PostgresConnection> {
    /// Connect over plain tokio-postgres
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let params = ConnectParams::new()
    ///     .with_host("examplecluster.abc123.us-west-2.redshift.amazonaws.com")
    ///     .with_user("awsuser")
    ///     .with_port(5439)
    ///     .with_database("dev");
    /// let client = RedshiftClient::connect(&params).await?;
    /// ```
    pub async fn connect(params: &ConnectParams) -> Result<Self, ClientError> {
        Self::connect_with(&PostgresConnector::new(), params).await
    }
}

impl<C: Connection> RedshiftClient<C> {
    /// Build the connection URL from `params` and connect through `connector`
    ///
    /// Fails with `NotImplemented` for an unsupported driver, `InvalidUrl` for
    /// an unparsable URL, and with the connector's own error if the
    /// connection cannot be opened.
    pub async fn connect_with<K>(connector: &K, params: &ConnectParams) -> Result<Self, ClientError>
    where
        K: Connector<Connection = C>,
    {
        let url = ConnectionUrl::from_params(params)?;
        let schema = params
            .schema
            .clone()
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
        let name = url.database().map(str::to_string);

        tracing::info!(backend = connector.name(), url = %url, schema = %schema, "connecting to warehouse");
        let con = connector.connect(&url).await?;

        Ok(Self {
            name,
            schema,
            url,
            con,
        })
    }

    pub fn current_database(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn current_schema(&self) -> &str {
        &self.schema
    }

    /// The client itself
    pub fn client(&self) -> &Self {
        self
    }

    /// The URL this client connected to
    pub fn url(&self) -> &ConnectionUrl {
        &self.url
    }

    /// The underlying warehouse connection
    pub fn connection(&self) -> &C {
        &self.con
    }

    /// Handle for `name`, or for the current database when `name` is `None`
    pub fn database(&self, name: Option<&str>) -> Option<RedshiftDatabase<'_, C>> {
        name.or(self.current_database())
            .map(|name| Database::new(name, self))
    }

    /// Names of all non-template databases, in server order
    pub async fn list_databases(&self) -> Result<Vec<String>, ClientError> {
        tracing::debug!("listing databases");
        let rows = self.con.execute(LIST_DATABASES_QUERY).await?;

        match rows.column("datname") {
            Some(names) => Ok(names.into_iter().flatten().map(str::to_string).collect()),
            None if rows.is_empty() => Ok(Vec::new()),
            None => Err(ClientError::Query(
                "database listing returned no datname column".to_string(),
            )),
        }
    }

    /// Table names in `database` (a schema), defaulting to the current schema
    ///
    /// With `like`, only names containing it as a plain, case-sensitive
    /// substring are kept. Catalog order is preserved.
    pub async fn list_tables(
        &self,
        like: Option<&str>,
        database: Option<&str>,
    ) -> Result<Vec<String>, ClientError> {
        let schema = database.unwrap_or(self.schema.as_str());
        tracing::debug!(schema = %schema, like = ?like, "listing tables");

        let mut names = self.con.table_names(schema).await?;
        if let Some(like) = like {
            names.retain(|name| name.contains(like));
        }
        Ok(names)
    }

    /// Whether `name` exists in `database` (a schema), defaulting to the current schema
    pub async fn exists_table(&self, name: &str, database: Option<&str>) -> Result<bool, ClientError> {
        let names = self.list_tables(None, database).await?;
        Ok(names.iter().any(|n| n == name))
    }

    /// Switching databases on a live client is not supported
    pub fn set_database(&self) -> Result<(), ClientError> {
        Err(ClientError::NotImplemented("set_database".to_string()))
    }

    /// Reflect `name` from the live catalog and wrap it in a table expression
    ///
    /// `database` names the schema and defaults to the current one. Every call
    /// reflects again.
    pub async fn table(
        &self,
        name: &str,
        database: Option<&str>,
    ) -> Result<TableExpr<RedshiftTable<'_, C>>, ClientError> {
        let schema = database.unwrap_or(self.schema.as_str());
        let reflected = self.reflect_table(name, Some(schema)).await?;
        let node = RedshiftTable::new(name, schema, reflected, self);
        Ok(TableExpr::new(node))
    }

    async fn reflect_table(&self, name: &str, schema: Option<&str>) -> Result<Schema, ClientError> {
        let schema = schema.unwrap_or(self.schema.as_str());
        tracing::debug!(schema = %schema, table = %name, "reflecting table");
        self.con.reflect_table(name, schema).await
    }

    /// Accepted and ignored; no DDL is issued
    pub fn create_table(
        &self,
        name: &str,
        expr: Option<&dyn TableNode>,
        schema: Option<&Schema>,
        database: Option<&str>,
    ) -> Result<(), ClientError> {
        tracing::debug!(
            table = %name,
            from_expr = expr.is_some(),
            with_schema = schema.is_some(),
            database = ?database,
            "create_table is a no-op"
        );
        Ok(())
    }

    /// Accepted and ignored; no DDL is issued
    pub fn drop_table(&self) -> Result<(), ClientError> {
        tracing::debug!("drop_table is a no-op");
        Ok(())
    }

    /// Close the connection and consume the client
    pub async fn close(self) {
        tracing::debug!(url = %self.url, "closing warehouse connection");
        self.con.close().await;
    }
}

impl<C: Connection> fmt::Debug for RedshiftClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedshiftClient")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCatalogBuilder, MockConnector};
    use redwire_core::{Column, LogicalType};

    fn params() -> ConnectParams {
        ConnectParams::new()
            .with_host("h")
            .with_user("u")
            .with_password("p")
            .with_port(5439)
            .with_database("d")
    }

    #[tokio::test]
    async fn test_connect_derives_name_and_default_schema() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params()).await.unwrap();

        assert_eq!(client.current_database(), Some("d"));
        assert_eq!(client.current_schema(), "public");
        assert_eq!(client.url().as_str(), "postgresql://u:p@h:5439/d");
        assert_eq!(connector.connect_calls(), 1);
        assert_eq!(connector.connected_urls().await, vec!["postgresql://u:p@h:5439/d"]);
    }

    #[tokio::test]
    async fn test_connect_with_explicit_schema() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params().with_schema("analytics"))
            .await
            .unwrap();

        assert_eq!(client.current_schema(), "analytics");
    }

    #[tokio::test]
    async fn test_unsupported_driver_never_connects() {
        let connector = MockConnector::new();
        let result = RedshiftClient::connect_with(&connector, &params().with_driver("other")).await;

        assert!(matches!(result, Err(ClientError::NotImplemented(d)) if d == "other"));
        assert_eq!(connector.connect_calls(), 0);
    }

    #[tokio::test]
    async fn test_connection_failure_is_fatal() {
        let connector = MockConnector::new().with_connection_failure();
        let result = RedshiftClient::connect_with(&connector, &params()).await;

        assert!(matches!(result, Err(ClientError::Connection(_))));
        assert_eq!(connector.connect_calls(), 1);
    }

    #[tokio::test]
    async fn test_set_database_always_fails() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params()).await.unwrap();

        assert!(matches!(client.set_database(), Err(ClientError::NotImplemented(_))));
        assert!(matches!(client.set_database(), Err(ClientError::NotImplemented(_))));
    }

    #[tokio::test]
    async fn test_table_defaults_to_current_schema() {
        let connector = MockCatalogBuilder::new()
            .with_table(
                "analytics",
                "orders",
                Schema::from_columns(vec![Column::new("id", LogicalType::Int)]),
            )
            .build();
        let client = RedshiftClient::connect_with(&connector, &params().with_schema("analytics"))
            .await
            .unwrap();

        let orders = client.table("orders", None).await.unwrap();
        assert_eq!(orders.op().qualified_name(), "analytics.orders");
        assert_eq!(orders.columns(), vec!["id"]);
        assert!(std::ptr::eq(orders.op().client(), &client));

        let missing = client.table("orders", Some("public")).await;
        assert!(matches!(missing, Err(ClientError::TableNotFound(t)) if t == "public.orders"));
    }

    #[tokio::test]
    async fn test_database_handle() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params()).await.unwrap();

        let current = client.database(None).unwrap();
        assert_eq!(current.name(), "d");
        assert!(std::ptr::eq(current.client(), &client));
        assert_eq!(client.database(Some("other")).unwrap().name(), "other");

        let client = RedshiftClient::connect_with(&connector, &ConnectParams::new().with_host("h"))
            .await
            .unwrap();
        assert!(client.database(None).is_none());
    }

    #[tokio::test]
    async fn test_ddl_is_inert() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params()).await.unwrap();

        assert!(client.create_table("t", None, None, None).is_ok());
        assert!(client.drop_table().is_ok());
        assert_eq!(connector.execute_calls(), 0);
        assert!(connector.executed_queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_client_identity() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params()).await.unwrap();
        assert!(std::ptr::eq(client.client(), &client));
    }

    #[tokio::test]
    async fn test_debug_hides_password() {
        let connector = MockConnector::new();
        let client = RedshiftClient::connect_with(&connector, &params()).await.unwrap();

        let debug = format!("{:?}", client);
        assert!(debug.contains("u:****@h"));
        assert!(!debug.contains(":p@"));
    }
}
