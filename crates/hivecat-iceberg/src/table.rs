//! Loaded table handle.

use std::sync::Arc;

use crate::error::IcebergResult;
use crate::metadata::{FileFormat, PartitionSpec, Schema, TableMetadata};

/// A table's current metadata together with the catalog context it was
/// loaded through.
///
/// The metadata is shared: handles for the same table version point at the
/// same [`TableMetadata`].
#[derive(Debug, Clone)]
pub struct IcebergTable {
    catalog: String,
    database: String,
    name: String,
    metadata: Arc<TableMetadata>,
}

impl IcebergTable {
    /// Creates a table handle.
    #[must_use]
    pub fn new(
        catalog: impl Into<String>,
        database: impl Into<String>,
        name: impl Into<String>,
        metadata: Arc<TableMetadata>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            database: database.into(),
            name: name.into(),
            metadata,
        }
    }

    /// Catalog the table was loaded through.
    #[must_use]
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `catalog.database.name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.database, self.name)
    }

    /// The shared metadata snapshot.
    #[must_use]
    pub fn metadata(&self) -> &Arc<TableMetadata> {
        &self.metadata
    }

    /// Table location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.metadata.location
    }

    /// Current schema.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.metadata.current_schema()
    }

    /// Default partition spec.
    #[must_use]
    pub fn spec(&self) -> Option<&PartitionSpec> {
        self.metadata.default_spec()
    }

    /// Data file format.
    ///
    /// # Errors
    ///
    /// Returns an error when the format property names an unknown format.
    pub fn file_format(&self) -> IcebergResult<FileFormat> {
        self.metadata.file_format()
    }

    /// Rendered partition fields of the default spec.
    #[must_use]
    pub fn partition_fields(&self) -> Vec<String> {
        self.metadata.partition_fields()
    }
}
