//! Redshift client adapter
//!
//! Connects to Amazon Redshift over the PostgreSQL wire protocol, lists
//! databases and tables from the warehouse catalog, and reflects tables into
//! typed [`TableExpr`](redwire_core::TableExpr) handles.
//!
//! ## Features
//!
//! - `tls` - TLS connections via native-tls
//!
//! ## Example
//!
//! ```rust,ignore
//! use redwire_catalog::RedshiftClient;
//! use redwire_core::ConnectParams;
//!
//! let params = ConnectParams::new()
//!     .with_host("examplecluster.abc123.us-west-2.redshift.amazonaws.com")
//!     .with_user("awsuser")
//!     .with_password("secret")
//!     .with_port(5439)
//!     .with_database("dev");
//!
//! let client = RedshiftClient::connect(&params).await?;
//! let tables = client.list_tables(Some("ord"), None).await?;
//! let orders = client.table("orders", None).await?;
//! ```
//!
//! Any backend implementing [`Connector`] can stand in for the warehouse;
//! [`MockConnector`] keeps everything in memory for tests.

pub mod adapter;
pub mod client;
pub mod mock;
pub mod postgres;
pub mod table;
pub mod url;

pub use adapter::{ClientError, Connection, Connector, RowSet};
pub use client::RedshiftClient;
pub use mock::{MockCatalogBuilder, MockConnection, MockConnector};
pub use postgres::{PostgresConnection, PostgresConnector};
pub use table::{RedshiftDatabase, RedshiftTable};
pub use url::{ConnectionUrl, DEFAULT_SCHEMA, SUPPORTED_DRIVER};
