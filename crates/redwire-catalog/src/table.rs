//! Redshift table and database handles

use crate::adapter::Connection;
use crate::client::RedshiftClient;
use redwire_core::{Database, Schema, TableNode};
use std::fmt;

/// A reflected Redshift table bound to the client that loaded it
pub struct RedshiftTable<'c, C: Connection> {
    name: String,
    namespace: String,
    schema: Schema,
    client: &'c RedshiftClient<C>,
}

impl<'c, C: Connection> RedshiftTable<'c, C> {
    pub(crate) fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        schema: Schema,
        client: &'c RedshiftClient<C>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            schema,
            client,
        }
    }

    /// The client this table was reflected through
    pub fn client(&self) -> &'c RedshiftClient<C> {
        self.client
    }
}

impl<C: Connection> TableNode for RedshiftTable<'_, C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> Option<&str> {
        Some(&self.namespace)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl<C: Connection> fmt::Debug for RedshiftTable<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedshiftTable")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("schema", &self.schema)
            .finish()
    }
}

/// A Redshift database handle
pub type RedshiftDatabase<'c, C> = Database<'c, RedshiftClient<C>>;
