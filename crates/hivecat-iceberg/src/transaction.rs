//! Create-table transactions.

use std::collections::BTreeMap;

use crate::error::IcebergResult;
use crate::manifest::DataFile;
use crate::metadata::{PartitionSpec, Schema, TableMetadata};
use crate::operations::HiveTableOperations;

/// Parameters of a new table.
#[derive(Debug, Clone)]
pub struct CreateTableRequest {
    /// Database (namespace) name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Initial schema.
    pub schema: Schema,
    /// Initial partition spec.
    pub partition_spec: PartitionSpec,
    /// Table location.
    pub location: String,
    /// Table properties.
    pub properties: BTreeMap<String, String>,
}

/// A table that exists only once [`commit`](Self::commit) succeeds.
///
/// An optional initial append is staged with [`append_files`](Self::append_files);
/// an empty append still produces a first snapshot, which readers of a freshly
/// created table can rely on.
#[derive(Debug)]
pub struct CreateTableTransaction {
    ops: HiveTableOperations,
    request: CreateTableRequest,
    owner: Option<String>,
    metadata: TableMetadata,
    pending_append: Option<Vec<DataFile>>,
}

impl CreateTableTransaction {
    pub(crate) fn new(
        ops: HiveTableOperations,
        request: CreateTableRequest,
        owner: Option<String>,
        metadata: TableMetadata,
    ) -> Self {
        Self {
            ops,
            request,
            owner,
            metadata,
            pending_append: None,
        }
    }

    /// Metadata the table will be created with, before any staged append.
    #[must_use]
    pub fn table_metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Stages data files for the first snapshot. Files staged by earlier calls
    /// are kept.
    pub fn append_files(&mut self, files: Vec<DataFile>) -> &mut Self {
        self.pending_append
            .get_or_insert_with(Vec::new)
            .extend(files);
        self
    }

    /// Writes the metadata and registers the table in the metastore.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::AlreadyExists`](crate::IcebergError::AlreadyExists)
    /// when the name is taken; files written by this transaction are removed.
    pub async fn commit(self) -> IcebergResult<TableMetadata> {
        let Self {
            ops,
            request,
            owner,
            metadata,
            pending_append,
        } = self;

        let (metadata, written) = match pending_append {
            Some(files) => ops.stage_append(&metadata, files).await?,
            None => (metadata, Vec::new()),
        };
        ops.commit_create(&request.database, &request.table, metadata, owner, written)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hivecat_core::MemoryBackend;
    use hivecat_metastore::{Database, HiveMetastore, InMemoryMetastore};

    use super::*;
    use crate::metadata::NestedField;

    #[tokio::test]
    async fn test_empty_append_creates_initial_snapshot() {
        let storage = Arc::new(MemoryBackend::new());
        let metastore = Arc::new(InMemoryMetastore::new());
        metastore
            .create_database(Database::new("sales"))
            .await
            .expect("database");
        let ops = HiveTableOperations::new(metastore, storage);

        let mut tx = ops.new_create_table_transaction(
            CreateTableRequest {
                database: "sales".into(),
                table: "st_1".into(),
                schema: Schema::new(vec![NestedField::optional(1, "x", "int")]),
                partition_spec: PartitionSpec::unpartitioned(),
                location: "memory://wh/sales/st_1".into(),
                properties: BTreeMap::new(),
            },
            None,
        );
        assert!(tx.table_metadata().current_snapshot().is_none());
        tx.append_files(vec![]);

        let committed = tx.commit().await.expect("commit");
        let snapshot = committed.current_snapshot().expect("initial snapshot");
        assert_eq!(snapshot.summary.get("added-data-files").map(String::as_str), Some("0"));

        let loaded = ops.load("sales", "st_1").await.expect("load");
        assert_eq!(loaded.current_snapshot_id, Some(snapshot.snapshot_id));
    }
}
