//! redwire core
//!
//! Warehouse-neutral building blocks shared by the catalog client and the CLI:
//! the logical type system used for reflected tables, the table-expression
//! and database value types, and connection configuration.

pub mod config;
pub mod expr;
pub mod schema;

pub use config::{Config, ConfigError, ConnectParams};
pub use expr::{Database, TableExpr, TableNode};
pub use schema::{Column, LogicalType, Nullability, Schema};
