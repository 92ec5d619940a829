//! Object identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespaces reserved for engine-internal metadata. They are hidden from
/// listings and never resolve views or redirects.
pub const SYSTEM_NAMESPACES: [&str; 2] = ["information_schema", "sys"];

/// Returns true for namespaces in [`SYSTEM_NAMESPACES`].
#[must_use]
pub fn is_system_namespace(namespace: &str) -> bool {
    SYSTEM_NAMESPACES.contains(&namespace)
}

/// A `(namespace, name)` pair, unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaTableName {
    /// Namespace (metastore database) name.
    pub schema: String,
    /// Table, view or materialized view name.
    pub table: String,
}

impl SchemaTableName {
    /// Creates an identifier.
    #[must_use]
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Returns a sibling identifier in the same namespace.
    #[must_use]
    pub fn sibling(&self, table: impl Into<String>) -> Self {
        Self::new(self.schema.clone(), table)
    }

    /// Returns the identifier with any trailing `$suffix` metadata marker
    /// removed, so `orders$partitions` names `orders`.
    #[must_use]
    pub fn base_table(&self) -> Self {
        match self.table.rfind('$') {
            Some(marker) => self.sibling(&self.table[..marker]),
            None => self.clone(),
        }
    }
}

impl fmt::Display for SchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// A [`SchemaTableName`] qualified by catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogSchemaTableName {
    /// Catalog name.
    pub catalog: String,
    /// Identifier within the catalog.
    pub schema_table: SchemaTableName,
}

impl CatalogSchemaTableName {
    /// Creates a qualified identifier.
    #[must_use]
    pub fn new(catalog: impl Into<String>, schema_table: SchemaTableName) -> Self {
        Self {
            catalog: catalog.into(),
            schema_table,
        }
    }
}

impl fmt::Display for CatalogSchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog, self.schema_table)
    }
}
