//! Test fixtures for client integration tests
//!
//! Table layouts resembling a small Redshift sales schema, plus a helper that
//! loads them into a mock catalog.

#![allow(dead_code)]

use redwire_catalog::{MockCatalogBuilder, MockConnector};
use redwire_core::{Column, ConnectParams, LogicalType, Nullability, Schema};

/// Typical orders table
pub fn orders_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("order_id", LogicalType::Int)
            .with_nullability(Nullability::No)
            .with_native_type("bigint"),
        Column::new("user_id", LogicalType::Int)
            .with_nullability(Nullability::No)
            .with_native_type("integer"),
        Column::new(
            "total_amount",
            LogicalType::Decimal {
                precision: Some(12),
                scale: Some(2),
            },
        )
        .with_nullability(Nullability::No)
        .with_native_type("numeric(12,2)"),
        Column::new("status", LogicalType::String)
            .with_nullability(Nullability::Yes)
            .with_native_type("character varying(32)"),
        Column::new("created_at", LogicalType::Timestamp)
            .with_nullability(Nullability::No)
            .with_native_type("timestamp without time zone"),
    ])
}

/// Typical users table
pub fn users_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("id", LogicalType::Int).with_nullability(Nullability::No),
        Column::new("email", LogicalType::String).with_nullability(Nullability::No),
        Column::new("attributes", LogicalType::Json).with_nullability(Nullability::Yes),
    ])
}

/// Line items belonging to an order
pub fn order_items_schema() -> Schema {
    Schema::from_columns(vec![
        Column::new("order_id", LogicalType::Int).with_nullability(Nullability::No),
        Column::new("sku", LogicalType::String).with_nullability(Nullability::No),
        Column::new("quantity", LogicalType::Int).with_nullability(Nullability::No),
    ])
}

/// A mock cluster with `prod`/`dev`/`analytics` databases (not in name
/// order), two template databases and three tables in `public`
/// (in the order orders, users, order_items)
pub fn sales_catalog() -> MockConnector {
    MockCatalogBuilder::new()
        .with_database("prod")
        .with_template_database("template0")
        .with_database("dev")
        .with_template_database("template1")
        .with_database("analytics")
        .with_table("public", "orders", orders_schema())
        .with_table("public", "users", users_schema())
        .with_table("public", "order_items", order_items_schema())
        .with_table("staging", "orders_raw", orders_schema())
        .build()
}

/// Parameters resembling a Redshift cluster endpoint
pub fn cluster_params() -> ConnectParams {
    ConnectParams::new()
        .with_host("examplecluster.abc123.us-west-2.redshift.amazonaws.com")
        .with_user("awsuser")
        .with_password("secret")
        .with_port(5439)
        .with_database("dev")
}
