//! Metastore error types.

use thiserror::Error;

/// Result type alias for metastore operations.
pub type MetastoreResult<T> = Result<T, MetastoreError>;

/// Errors returned by metastore implementations.
///
/// Callers are only expected to distinguish "not found" from everything else;
/// the remaining variants exist for diagnostics.
#[derive(Debug, Error)]
pub enum MetastoreError {
    /// The database does not exist.
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// Database name.
        name: String,
    },

    /// The table does not exist.
    #[error("table not found: {database}.{table}")]
    TableNotFound {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
    },

    /// A database with this name already exists.
    #[error("database already exists: {name}")]
    DatabaseAlreadyExists {
        /// Database name.
        name: String,
    },

    /// A table with this name already exists.
    #[error("table already exists: {database}.{table}")]
    TableAlreadyExists {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
    },

    /// The request is not valid for the current metastore state.
    #[error("invalid metastore operation: {message}")]
    InvalidOperation {
        /// Description of the rejected operation.
        message: String,
    },

    /// The metastore could not be reached or failed internally.
    #[error("metastore unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// Deleting data on behalf of a drop failed.
    #[error("metastore storage error: {0}")]
    Storage(#[from] hivecat_core::Error),
}

impl MetastoreError {
    /// Creates a table not found error.
    #[must_use]
    pub fn table_not_found(database: &str, table: &str) -> Self {
        Self::TableNotFound {
            database: database.to_string(),
            table: table.to_string(),
        }
    }

    /// Creates a database not found error.
    #[must_use]
    pub fn database_not_found(name: &str) -> Self {
        Self::DatabaseNotFound {
            name: name.to_string(),
        }
    }

    /// Returns true for the not-found variants.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DatabaseNotFound { .. } | Self::TableNotFound { .. }
        )
    }
}
