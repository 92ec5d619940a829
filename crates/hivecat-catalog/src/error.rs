//! Catalog error taxonomy.
//!
//! Metastore and table-format failures are translated into the object-specific
//! variants only where the caller knows which kind of object it addressed;
//! everything else is wrapped unchanged.

use hivecat_iceberg::IcebergError;
use hivecat_metastore::MetastoreError;
use thiserror::Error;

use crate::identifier::SchemaTableName;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors returned by [`HiveCatalog`](crate::HiveCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The namespace does not exist.
    #[error("namespace not found: {namespace}")]
    NamespaceNotFound {
        /// Namespace name.
        namespace: String,
    },

    /// The table does not exist.
    #[error("table not found: {table}")]
    TableNotFound {
        /// Table identifier.
        table: SchemaTableName,
    },

    /// The view does not exist.
    #[error("view not found: {view}")]
    ViewNotFound {
        /// View identifier.
        view: SchemaTableName,
    },

    /// The materialized view does not exist.
    #[error("materialized view not found: {view}")]
    MaterializedViewNotFound {
        /// Materialized view identifier.
        view: SchemaTableName,
    },

    /// A namespace with this name already exists.
    #[error("namespace already exists: {namespace}")]
    NamespaceAlreadyExists {
        /// Namespace name.
        namespace: String,
    },

    /// A table with this name already exists.
    #[error("table already exists: {table}")]
    TableAlreadyExists {
        /// Table identifier.
        table: SchemaTableName,
    },

    /// A view (or another object) with this name already exists.
    #[error("view already exists: {view}")]
    ViewAlreadyExists {
        /// View identifier.
        view: SchemaTableName,
    },

    /// A materialized view (or another object) with this name already exists.
    #[error("materialized view already exists: {view}")]
    MaterializedViewAlreadyExists {
        /// Materialized view identifier.
        view: SchemaTableName,
    },

    /// The namespace still contains tables or views.
    #[error("namespace not empty: {namespace}")]
    NamespaceNotEmpty {
        /// Namespace name.
        namespace: String,
    },

    /// The operation is not supported by this catalog or table format.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Why the operation was refused.
        message: String,
    },

    /// A supplied property is invalid, such as an unreachable location.
    #[error("invalid property: {message}")]
    InvalidProperty {
        /// Description of the problem.
        message: String,
    },

    /// A stored record is malformed.
    #[error("invalid metadata: {message}")]
    InvalidMetadata {
        /// Description of the problem.
        message: String,
    },

    /// The metastore failed.
    #[error("metastore error: {0}")]
    Metastore(#[source] MetastoreError),

    /// The table format failed.
    #[error("table format error: {0}")]
    TableFormat(#[source] IcebergError),

    /// Object storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] hivecat_core::Error),
}

impl CatalogError {
    /// Returns true for any of the not-found variants.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NamespaceNotFound { .. }
            | Self::TableNotFound { .. }
            | Self::ViewNotFound { .. }
            | Self::MaterializedViewNotFound { .. } => true,
            Self::Metastore(err) => err.is_not_found(),
            Self::TableFormat(err) => err.is_not_found(),
            Self::Storage(err) => err.is_not_found(),
            _ => false,
        }
    }

    pub(crate) fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            message: message.into(),
        }
    }
}

/// The kind of object a metastore call addressed, used to pick the
/// not-found and already-exists variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectKind {
    Table,
    View,
    MaterializedView,
}

impl ObjectKind {
    pub(crate) fn not_found(self, name: SchemaTableName) -> CatalogError {
        match self {
            Self::Table => CatalogError::TableNotFound { table: name },
            Self::View => CatalogError::ViewNotFound { view: name },
            Self::MaterializedView => CatalogError::MaterializedViewNotFound { view: name },
        }
    }

    pub(crate) fn already_exists(self, name: SchemaTableName) -> CatalogError {
        match self {
            Self::Table => CatalogError::TableAlreadyExists { table: name },
            Self::View => CatalogError::ViewAlreadyExists { view: name },
            Self::MaterializedView => CatalogError::MaterializedViewAlreadyExists { view: name },
        }
    }

    /// Translates a metastore failure for an object of this kind.
    pub(crate) fn metastore_error(self, err: MetastoreError) -> CatalogError {
        match err {
            MetastoreError::TableNotFound { database, table } => {
                self.not_found(SchemaTableName::new(database, table))
            }
            MetastoreError::TableAlreadyExists { database, table } => {
                self.already_exists(SchemaTableName::new(database, table))
            }
            other => namespace_error(other),
        }
    }

    /// Translates a table-format failure for an object of this kind.
    pub(crate) fn format_error(self, err: IcebergError) -> CatalogError {
        match err {
            IcebergError::TableNotFound { database, table } => {
                self.not_found(SchemaTableName::new(database, table))
            }
            IcebergError::AlreadyExists { database, table } => {
                self.already_exists(SchemaTableName::new(database, table))
            }
            IcebergError::Unsupported { message } => CatalogError::Unsupported { message },
            IcebergError::Metastore(inner) => self.metastore_error(inner),
            other => CatalogError::TableFormat(other),
        }
    }
}

/// Translates a metastore failure of a namespace-level call.
pub(crate) fn namespace_error(err: MetastoreError) -> CatalogError {
    match err {
        MetastoreError::DatabaseNotFound { name } => {
            CatalogError::NamespaceNotFound { namespace: name }
        }
        MetastoreError::DatabaseAlreadyExists { name } => {
            CatalogError::NamespaceAlreadyExists { namespace: name }
        }
        other => CatalogError::Metastore(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metastore_errors_map_by_kind() {
        let err = ObjectKind::View.metastore_error(MetastoreError::table_not_found("s", "v"));
        assert!(matches!(err, CatalogError::ViewNotFound { ref view } if view.table == "v"));

        let err = ObjectKind::MaterializedView.metastore_error(MetastoreError::TableAlreadyExists {
            database: "s".into(),
            table: "mv".into(),
        });
        assert!(matches!(err, CatalogError::MaterializedViewAlreadyExists { .. }));

        let err = ObjectKind::Table.metastore_error(MetastoreError::database_not_found("s"));
        assert!(matches!(err, CatalogError::NamespaceNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_format_errors_keep_unsupported() {
        let err = ObjectKind::Table.format_error(IcebergError::Unsupported {
            message: "path overrides".into(),
        });
        assert!(matches!(err, CatalogError::Unsupported { .. }));

        let err = ObjectKind::Table.format_error(IcebergError::invalid_metadata("bad"));
        assert!(matches!(err, CatalogError::TableFormat(_)));
    }
}
