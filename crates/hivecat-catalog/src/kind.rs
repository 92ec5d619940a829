//! Classification of raw metastore records.
//!
//! A record is classified once, when it is read; the rest of the catalog
//! matches on [`RecordKind`] instead of re-inspecting parameters.

use hivecat_iceberg::is_iceberg_table;
use hivecat_metastore::{TABLE_COMMENT, Table, TableType};

use crate::view::MATERIALIZED_VIEW_COMMENT;

/// Record parameter flagging views written by this catalog.
pub const PRESTO_VIEW_FLAG: &str = "presto_view";

/// Record parameter naming a materialized view's storage table.
pub const STORAGE_TABLE: &str = "storage_table";

/// Record parameter holding the query that created a view.
pub const PRESTO_QUERY_ID: &str = "presto_query_id";

/// Record parameter identifying the writer of a view.
pub const TRINO_CREATED_BY: &str = "trino_created_by";

/// What a metastore record represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// A table in this catalog's table format.
    Iceberg,
    /// A table in some other format registered in the same metastore.
    Foreign,
    /// A view written by this catalog.
    View,
    /// A materialized view written by this catalog.
    MaterializedView {
        /// Storage table name in the same namespace, if recorded.
        storage_table: Option<String>,
    },
    /// A view this catalog did not write.
    HiveView,
}

impl RecordKind {
    /// Classifies a record.
    #[must_use]
    pub fn of(table: &Table) -> Self {
        let is_view_type = matches!(
            table.table_type,
            TableType::VirtualView | TableType::MaterializedView
        );
        if !is_view_type {
            return if is_iceberg_table(table) {
                Self::Iceberg
            } else {
                Self::Foreign
            };
        }

        if table.parameter(PRESTO_VIEW_FLAG) != Some("true") {
            return Self::HiveView;
        }

        let storage_table = table.parameter(STORAGE_TABLE).map(str::to_string);
        if storage_table.is_some() || table.parameter(TABLE_COMMENT) == Some(MATERIALIZED_VIEW_COMMENT) {
            return Self::MaterializedView { storage_table };
        }
        Self::View
    }

    /// Returns true for every view-like kind.
    #[must_use]
    pub fn is_view(&self) -> bool {
        matches!(
            self,
            Self::View | Self::MaterializedView { .. } | Self::HiveView
        )
    }
}
