//! Table-format error types.

use hivecat_metastore::MetastoreError;
use thiserror::Error;

/// Result type alias for table-format operations.
pub type IcebergResult<T> = Result<T, IcebergError>;

/// Errors raised by the table-format layer.
#[derive(Debug, Error)]
pub enum IcebergError {
    /// No metastore record exists for the table.
    #[error("table not found: {database}.{table}")]
    TableNotFound {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
    },

    /// A metadata file, manifest or column does not exist.
    #[error("not found: {message}")]
    NotFound {
        /// What was missing.
        message: String,
    },

    /// A table with the requested name already exists.
    #[error("table already exists: {database}.{table}")]
    AlreadyExists {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
    },

    /// The metadata pointer moved while a commit was in flight.
    #[error("commit conflict: {message}")]
    CommitConflict {
        /// Description of the conflict.
        message: String,
    },

    /// Stored metadata is missing, malformed, or not Iceberg metadata.
    #[error("invalid table metadata: {message}")]
    InvalidMetadata {
        /// Description of the problem.
        message: String,
    },

    /// The format forbids the requested operation.
    #[error("unsupported: {message}")]
    Unsupported {
        /// Why the operation is not allowed.
        message: String,
    },

    /// Object storage failed.
    #[error("table storage error: {0}")]
    Storage(#[from] hivecat_core::Error),

    /// The metastore failed.
    #[error("table metastore error: {0}")]
    Metastore(#[from] MetastoreError),
}

impl IcebergError {
    /// Creates a table not found error.
    #[must_use]
    pub fn table_not_found(database: &str, table: &str) -> Self {
        Self::TableNotFound {
            database: database.to_string(),
            table: table.to_string(),
        }
    }

    /// Creates an invalid metadata error.
    #[must_use]
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            message: message.into(),
        }
    }

    /// Returns true when the failure means the table (or a file it references)
    /// is gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::TableNotFound { .. } | Self::NotFound { .. } => true,
            Self::Storage(err) => err.is_not_found(),
            Self::Metastore(err) => err.is_not_found(),
            _ => false,
        }
    }
}
