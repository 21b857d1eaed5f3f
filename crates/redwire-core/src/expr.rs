//! Table expressions and database handles
//!
//! A [`TableExpr`] is the typed handle the query layer builds on. It wraps a
//! backend-specific [`TableNode`] that knows the table's name and reflected
//! schema. [`Database`] is a named container bound to the client that
//! produced it.

use crate::schema::{Column, Schema};
use std::fmt;

/// A physical table known to a backend
pub trait TableNode {
    /// Unqualified table name
    fn name(&self) -> &str;

    /// Schema (namespace) the table lives in, if any
    fn namespace(&self) -> Option<&str>;

    /// Reflected column layout
    fn schema(&self) -> &Schema;

    /// `namespace.name`, or just `name` when there is no namespace
    fn qualified_name(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{}.{}", ns, self.name()),
            None => self.name().to_string(),
        }
    }
}

/// Typed table expression over a backend table node
#[derive(Debug, Clone)]
pub struct TableExpr<N> {
    op: N,
}

impl<N: TableNode> TableExpr<N> {
    /// Wrap a table node
    pub fn new(op: N) -> Self {
        Self { op }
    }

    /// The underlying table node
    pub fn op(&self) -> &N {
        &self.op
    }

    /// Unwrap into the underlying table node
    pub fn into_op(self) -> N {
        self.op
    }

    pub fn schema(&self) -> &Schema {
        self.op.schema()
    }

    /// Column names in table order
    pub fn columns(&self) -> Vec<&str> {
        self.op.schema().column_names()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.op.schema().find_column(name)
    }
}

impl<N: TableNode> fmt::Display for TableExpr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Table: {}", self.op.qualified_name())?;
        for column in &self.op.schema().columns {
            writeln!(f, "  {} : {}", column.name, column.logical_type)?;
        }
        Ok(())
    }
}

/// A named database bound to the client that produced it
pub struct Database<'c, C> {
    name: String,
    client: &'c C,
}

impl<'c, C> Database<'c, C> {
    pub fn new(name: impl Into<String>, client: &'c C) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The client this database was obtained from
    pub fn client(&self) -> &'c C {
        self.client
    }
}

impl<C> fmt::Debug for Database<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

impl<C> PartialEq for Database<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::eq(self.client, other.client)
    }
}
