//! Reflected table schemas and the logical type system

use serde::{Deserialize, Serialize};

/// Portable logical type system
///
/// Warehouse column types are mapped onto this set when a table is reflected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogicalType {
    /// Boolean type
    Bool,

    /// Integer type (any precision)
    Int,

    /// Floating point (any precision)
    Float,

    /// Decimal with precision and scale
    Decimal {
        precision: Option<u16>,
        scale: Option<u16>,
    },

    /// String/text type
    String,

    /// Raw bytes
    Binary,

    /// Date (no time component)
    Date,

    /// Timestamp (with time component)
    Timestamp,

    /// JSON / semi-structured (Redshift SUPER)
    Json,

    /// Spatial types
    Geometry,

    /// Array type
    Array {
        element_type: Box<LogicalType>,
    },

    /// Unknown type (cannot infer)
    Unknown,
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Int => write!(f, "INT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => write!(f, "DECIMAL({}, {})", p, s),
                (Some(p), None) => write!(f, "DECIMAL({})", p),
                _ => write!(f, "DECIMAL"),
            },
            Self::String => write!(f, "STRING"),
            Self::Binary => write!(f, "BINARY"),
            Self::Date => write!(f, "DATE"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Json => write!(f, "JSON"),
            Self::Geometry => write!(f, "GEOMETRY"),
            Self::Array { element_type } => write!(f, "ARRAY<{}>", element_type),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Nullability state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nullability {
    /// Definitely nullable
    Yes,

    /// Definitely not nullable
    No,

    /// Cannot determine nullability
    Unknown,
}

impl Nullability {
    /// Interpret an `information_schema` `is_nullable` value
    pub fn from_is_nullable(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "YES" => Self::Yes,
            "NO" => Self::No,
            _ => Self::Unknown,
        }
    }
}

/// A column in a schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Logical type
    pub logical_type: LogicalType,

    /// Nullability
    pub nullable: Nullability,

    /// Type name as reported by the warehouse, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<String>,
}

impl Column {
    /// Create a new column with unknown nullability
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable: Nullability::Unknown,
            native_type: None,
        }
    }

    /// Set nullability
    pub fn with_nullability(mut self, nullable: Nullability) -> Self {
        self.nullable = nullable;
        self
    }

    /// Record the warehouse's own name for the column type
    pub fn with_native_type(mut self, native_type: impl Into<String>) -> Self {
        self.native_type = Some(native_type.into());
        self
    }
}

/// An ordered collection of columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of columns
    pub columns: Vec<Column>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Create a schema from columns
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_type_display() {
        assert_eq!(LogicalType::Bool.to_string(), "BOOL");
        assert_eq!(
            LogicalType::Decimal { precision: Some(10), scale: Some(2) }.to_string(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(
            LogicalType::Array { element_type: Box::new(LogicalType::Int) }.to_string(),
            "ARRAY<INT>"
        );
    }

    #[test]
    fn schema_operations() {
        let schema = Schema::from_columns(vec![
            Column::new("id", LogicalType::Int),
            Column::new("name", LogicalType::String),
        ]);

        assert_eq!(schema.column_names(), vec!["id", "name"]);
        assert_eq!(schema.len(), 2);
        assert!(schema.find_column("id").is_some());
        assert!(schema.find_column("nonexistent").is_none());
        assert!(Schema::default().is_empty());
    }

    #[test]
    fn nullability_from_information_schema() {
        assert_eq!(Nullability::from_is_nullable("YES"), Nullability::Yes);
        assert_eq!(Nullability::from_is_nullable("no"), Nullability::No);
        assert_eq!(Nullability::from_is_nullable(""), Nullability::Unknown);
    }

    #[test]
    fn schema_serializes_to_json() {
        let schema = Schema::from_columns(vec![
            Column::new("total", LogicalType::Decimal { precision: Some(12), scale: Some(2) })
                .with_nullability(Nullability::No)
                .with_native_type("numeric(12,2)"),
            Column::new("note", LogicalType::String),
        ]);

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["columns"][0]["logical_type"]["type"], "decimal");
        assert_eq!(json["columns"][0]["nullable"], "no");
        assert_eq!(json["columns"][0]["native_type"], "numeric(12,2)");
        assert!(json["columns"][1].get("native_type").is_none());

        let parsed: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, schema);
    }
}
