//! Table operations over a metastore record and object storage.
//!
//! The metastore record of a table holds a `metadata_location` parameter; the
//! file it names is the current [`TableMetadata`]. A commit writes the next
//! metadata file, then swaps the parameter after checking that it still names
//! the version the commit was based on.

use std::sync::Arc;

use chrono::Utc;
use hivecat_core::storage::{PutMode, PutOutcome, StorageBackend};
use hivecat_metastore::{
    Column, HiveMetastore, MetastoreError, PrincipalPrivileges, Table, TableType,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{IcebergError, IcebergResult};
use crate::manifest::{self, DataFile, Manifest, ManifestFile, ManifestList};
use crate::metadata::{COMMENT_PROPERTY, Schema, Snapshot, TableMetadata};
use crate::paths;
use crate::transaction::{CreateTableRequest, CreateTableTransaction};

/// Record parameter naming the table format.
pub const TABLE_TYPE_PROP: &str = "table_type";

/// Value of [`TABLE_TYPE_PROP`] for tables managed by this crate.
pub const ICEBERG_TABLE_TYPE_VALUE: &str = "ICEBERG";

/// Record parameter pointing at the current metadata file.
pub const METADATA_LOCATION_PROP: &str = "metadata_location";

/// Record parameter pointing at the metadata file replaced by the last commit.
pub const PREVIOUS_METADATA_LOCATION_PROP: &str = "previous_metadata_location";

/// Returns true when a metastore record is managed by this table format.
#[must_use]
pub fn is_iceberg_table(table: &Table) -> bool {
    table
        .parameter(TABLE_TYPE_PROP)
        .is_some_and(|value| value.eq_ignore_ascii_case(ICEBERG_TABLE_TYPE_VALUE))
}

/// Loads, commits and drops tables.
#[derive(Clone)]
pub struct HiveTableOperations {
    metastore: Arc<dyn HiveMetastore>,
    storage: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for HiveTableOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HiveTableOperations").finish_non_exhaustive()
    }
}

impl HiveTableOperations {
    /// Creates table operations over a metastore and a storage backend.
    #[must_use]
    pub fn new(metastore: Arc<dyn HiveMetastore>, storage: Arc<dyn StorageBackend>) -> Self {
        Self { metastore, storage }
    }

    /// Returns the storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Resolves the current metadata of a table.
    ///
    /// # Errors
    ///
    /// - [`IcebergError::NotFound`] when the record or its metadata file is gone.
    /// - [`IcebergError::InvalidMetadata`] when the record is not an Iceberg
    ///   table or the metadata file cannot be parsed.
    pub async fn load(&self, database: &str, table: &str) -> IcebergResult<TableMetadata> {
        let record = self
            .metastore
            .get_table(database, table)
            .await?
            .ok_or_else(|| IcebergError::table_not_found(database, table))?;
        let location = current_metadata_location(&record)?;
        self.read_metadata(location).await
    }

    /// Reads and parses one metadata file.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::NotFound`] when the file does not exist.
    pub async fn read_metadata(&self, metadata_location: &str) -> IcebergResult<TableMetadata> {
        let bytes = self.storage.get(metadata_location).await.map_err(|err| {
            if err.is_not_found() {
                IcebergError::NotFound {
                    message: format!("metadata file {metadata_location}"),
                }
            } else {
                IcebergError::Storage(err)
            }
        })?;
        TableMetadata::from_json(&bytes, metadata_location)
    }

    /// Begins a create-table transaction.
    ///
    /// Nothing is written until [`CreateTableTransaction::commit`].
    #[must_use]
    pub fn new_create_table_transaction(
        &self,
        request: CreateTableRequest,
        owner: Option<String>,
    ) -> CreateTableTransaction {
        let metadata = TableMetadata::new(
            request.location.clone(),
            request.schema.clone(),
            request.partition_spec.clone(),
            request.properties.clone(),
            Utc::now().timestamp_millis(),
        );
        CreateTableTransaction::new(self.clone(), request, owner, metadata)
    }

    /// Writes the first metadata version and registers the table record.
    ///
    /// Files written before a failed registration are removed again.
    pub(crate) async fn commit_create(
        &self,
        database: &str,
        table: &str,
        metadata: TableMetadata,
        owner: Option<String>,
        mut written: Vec<String>,
    ) -> IcebergResult<TableMetadata> {
        let result = async {
            let metadata_location = self.write_metadata(&metadata, 0).await?;
            written.push(metadata_location.clone());

            let schema = metadata
                .current_schema()
                .ok_or_else(|| IcebergError::invalid_metadata("current schema missing"))?;
            let record = Table::new(database, table, TableType::ExternalTable)
                .with_owner(owner.clone())
                .with_columns(hive_columns(schema))
                .with_location(metadata.location.clone())
                .with_parameter(TABLE_TYPE_PROP, ICEBERG_TABLE_TYPE_VALUE)
                .with_parameter(METADATA_LOCATION_PROP, metadata_location.clone());
            let privileges =
                owner.map_or_else(PrincipalPrivileges::none, PrincipalPrivileges::initial_for);

            self.metastore
                .create_table(record, privileges)
                .await
                .map_err(|err| match err {
                    MetastoreError::TableAlreadyExists { database, table } => {
                        IcebergError::AlreadyExists { database, table }
                    }
                    other => IcebergError::Metastore(other),
                })?;

            let mut committed = metadata;
            committed.metadata_location = Some(metadata_location);
            Ok::<_, IcebergError>(committed)
        }
        .await;

        if result.is_err() {
            self.delete_files(&written).await;
        }
        result
    }

    /// Appends data files to a table in a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::CommitConflict`] when another commit moved the
    /// table's metadata pointer first.
    pub async fn append_files(
        &self,
        database: &str,
        table: &str,
        files: Vec<DataFile>,
    ) -> IcebergResult<TableMetadata> {
        let base = self.load(database, table).await?;
        let (next, written) = self.stage_append(&base, files).await?;
        match self.commit(database, table, &base, next).await {
            Ok(committed) => Ok(committed),
            Err(err) => {
                self.delete_files(&written).await;
                Err(err)
            }
        }
    }

    /// Sets or clears the format-level table comment.
    ///
    /// # Errors
    ///
    /// Propagates load and commit failures.
    pub async fn update_table_comment(
        &self,
        database: &str,
        table: &str,
        comment: Option<String>,
    ) -> IcebergResult<TableMetadata> {
        let base = self.load(database, table).await?;
        let next = base.with_property(COMMENT_PROPERTY, comment, Utc::now().timestamp_millis());
        self.commit(database, table, &base, next).await
    }

    /// Sets or clears the format-level comment of a column.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::NotFound`] for an unknown column and propagates
    /// load and commit failures.
    pub async fn update_column_comment(
        &self,
        database: &str,
        table: &str,
        column: &str,
        comment: Option<String>,
    ) -> IcebergResult<TableMetadata> {
        let base = self.load(database, table).await?;
        let next = base.with_column_doc(column, comment, Utc::now().timestamp_millis())?;
        self.commit(database, table, &base, next).await
    }

    /// Checks whether the table's files can be deleted safely.
    ///
    /// # Errors
    ///
    /// Returns [`IcebergError::Unsupported`] when path-override properties
    /// place files outside the table location.
    pub fn validate_table_can_be_dropped(metadata: &TableMetadata) -> IcebergResult<()> {
        let overrides = metadata.path_overrides();
        if overrides.is_empty() {
            return Ok(());
        }
        Err(IcebergError::Unsupported {
            message: format!(
                "table at {} has path override properties {}; refusing to drop its files",
                metadata.location,
                overrides.join(", ")
            ),
        })
    }

    /// Deletes data files, manifests, manifest lists and metadata files
    /// reachable from `metadata`.
    ///
    /// Individual delete failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Never fails today; the `Result` leaves room for backends that must
    /// abort.
    pub async fn drop_table_data(&self, metadata: &TableMetadata) -> IcebergResult<()> {
        let mut manifest_paths = Vec::new();
        let mut data_paths = Vec::new();

        for snapshot in &metadata.snapshots {
            let list: ManifestList = match self.read_json(&snapshot.manifest_list).await {
                Ok(list) => list,
                Err(err) => {
                    warn!(path = %snapshot.manifest_list, error = %err, "Failed to read manifest list");
                    continue;
                }
            };
            for entry in list.manifests {
                if manifest_paths.contains(&entry.manifest_path) {
                    continue;
                }
                match self.read_json::<Manifest>(&entry.manifest_path).await {
                    Ok(manifest) => {
                        data_paths.extend(manifest.files.into_iter().map(|file| file.file_path));
                    }
                    Err(err) => {
                        warn!(path = %entry.manifest_path, error = %err, "Failed to read manifest");
                    }
                }
                manifest_paths.push(entry.manifest_path);
            }
        }

        let manifest_lists: Vec<String> = metadata
            .snapshots
            .iter()
            .map(|snapshot| snapshot.manifest_list.clone())
            .collect();
        let metadata_files: Vec<String> = metadata
            .metadata_log
            .iter()
            .map(|entry| entry.metadata_file.clone())
            .chain(metadata.metadata_location.clone())
            .collect();

        self.delete_files(&data_paths).await;
        self.delete_files(&manifest_paths).await;
        self.delete_files(&manifest_lists).await;
        self.delete_files(&metadata_files).await;
        debug!(
            location = %metadata.location,
            data_files = data_paths.len(),
            manifests = manifest_paths.len(),
            "Dropped table data"
        );
        Ok(())
    }

    /// Writes the manifest and manifest list for an append and returns the
    /// uncommitted next version plus the paths written.
    pub(crate) async fn stage_append(
        &self,
        base: &TableMetadata,
        files: Vec<DataFile>,
    ) -> IcebergResult<(TableMetadata, Vec<String>)> {
        let mut written = Vec::new();
        let result = self.write_snapshot_files(base, files, &mut written).await;
        if result.is_err() {
            self.delete_files(&written).await;
        }
        result.map(|next| (next, written))
    }

    async fn write_snapshot_files(
        &self,
        base: &TableMetadata,
        files: Vec<DataFile>,
        written: &mut Vec<String>,
    ) -> IcebergResult<TableMetadata> {
        let now_ms = Utc::now().timestamp_millis();
        let snapshot_id = new_snapshot_id();
        let parent = base.current_snapshot();

        let mut list = match parent {
            Some(parent) => self.read_json::<ManifestList>(&parent.manifest_list).await?,
            None => ManifestList::default(),
        };

        let added_files = files.len() as u64;
        let added_rows: u64 = files.iter().map(|file| file.record_count).sum();
        if !files.is_empty() {
            let manifest_path = paths::manifest_path(&base.location);
            let manifest = Manifest {
                added_snapshot_id: snapshot_id,
                files,
            };
            self.put_new(&manifest_path, manifest::encode(&manifest)?).await?;
            written.push(manifest_path.clone());
            list.manifests.push(ManifestFile {
                manifest_path,
                added_snapshot_id: snapshot_id,
                added_files_count: added_files,
                added_rows_count: added_rows,
            });
        }

        let manifest_list = paths::manifest_list_path(&base.location, snapshot_id);
        self.put_new(&manifest_list, manifest::encode(&list)?).await?;
        written.push(manifest_list.clone());

        let snapshot = Snapshot {
            snapshot_id,
            parent_snapshot_id: parent.map(|p| p.snapshot_id),
            sequence_number: base.last_sequence_number + 1,
            timestamp_ms: now_ms,
            manifest_list,
            summary: [
                ("operation".to_string(), "append".to_string()),
                ("added-data-files".to_string(), added_files.to_string()),
                ("added-records".to_string(), added_rows.to_string()),
            ]
            .into_iter()
            .collect(),
            schema_id: base.current_schema_id,
        };
        Ok(base.with_snapshot(snapshot, now_ms))
    }

    /// Writes `next` and swaps the record's metadata pointer from `base` to it.
    async fn commit(
        &self,
        database: &str,
        table: &str,
        base: &TableMetadata,
        next: TableMetadata,
    ) -> IcebergResult<TableMetadata> {
        let base_location = base
            .metadata_location
            .as_deref()
            .ok_or_else(|| IcebergError::invalid_metadata("base metadata was never committed"))?;
        let version = paths::parse_metadata_version(base_location)
            .map_or_else(|| next.metadata_log.len(), |v| v as usize + 1);
        let version = u32::try_from(version)
            .map_err(|_| IcebergError::invalid_metadata("metadata version overflow"))?;
        let new_location = self.write_metadata(&next, version).await?;

        let swapped = self
            .swap_pointer(database, table, base_location, &new_location)
            .await;
        if let Err(err) = swapped {
            self.delete_files(std::slice::from_ref(&new_location)).await;
            return Err(err);
        }

        let mut committed = next;
        committed.metadata_location = Some(new_location);
        Ok(committed)
    }

    async fn swap_pointer(
        &self,
        database: &str,
        table: &str,
        expected: &str,
        new_location: &str,
    ) -> IcebergResult<()> {
        let record = self
            .metastore
            .get_table(database, table)
            .await?
            .ok_or_else(|| IcebergError::table_not_found(database, table))?;
        let current = current_metadata_location(&record)?;
        if current != expected {
            return Err(IcebergError::CommitConflict {
                message: format!(
                    "{database}.{table} moved from {expected} to {current} during commit"
                ),
            });
        }

        let privileges = record
            .owner
            .clone()
            .map_or_else(PrincipalPrivileges::none, PrincipalPrivileges::initial_for);
        let updated = record
            .with_parameter(PREVIOUS_METADATA_LOCATION_PROP, expected)
            .with_parameter(METADATA_LOCATION_PROP, new_location);
        self.metastore
            .replace_table(database, table, updated, privileges)
            .await?;
        debug!(database, table, metadata_location = %new_location, "Committed table metadata");
        Ok(())
    }

    async fn write_metadata(&self, metadata: &TableMetadata, version: u32) -> IcebergResult<String> {
        let location = paths::metadata_file_path(&metadata.location, version);
        self.put_new(&location, metadata.to_json()?).await?;
        Ok(location)
    }

    async fn put_new(&self, path: &str, bytes: bytes::Bytes) -> IcebergResult<()> {
        match self
            .storage
            .put(path, bytes, PutMode::Create)
            .await?
        {
            PutOutcome::Written => Ok(()),
            PutOutcome::AlreadyExists => Err(IcebergError::CommitConflict {
                message: format!("file already exists: {path}"),
            }),
        }
    }

    async fn read_json<T: for<'de> serde::Deserialize<'de>>(&self, path: &str) -> IcebergResult<T> {
        let bytes = self.storage.get(path).await?;
        manifest::decode(&bytes, path)
    }

    async fn delete_files(&self, paths: &[String]) {
        for path in paths {
            if let Err(err) = self.storage.delete(path).await {
                warn!(path = %path, error = %err, "Failed to delete table file");
            }
        }
    }
}

fn current_metadata_location(record: &Table) -> IcebergResult<&str> {
    if !is_iceberg_table(record) {
        return Err(IcebergError::invalid_metadata(format!(
            "{}.{} is not an Iceberg table",
            record.database_name, record.table_name
        )));
    }
    record.parameter(METADATA_LOCATION_PROP).ok_or_else(|| {
        IcebergError::invalid_metadata(format!(
            "{}.{} has no {METADATA_LOCATION_PROP}",
            record.database_name, record.table_name
        ))
    })
}

/// Metastore columns mirroring the table schema, for engines that only read
/// the record.
fn hive_columns(schema: &Schema) -> Vec<Column> {
    schema
        .fields
        .iter()
        .map(|field| {
            let mut column = Column::new(field.name.clone(), hive_type(&field.field_type));
            column.comment.clone_from(&field.doc);
            column
        })
        .collect()
}

fn hive_type(field_type: &str) -> String {
    match field_type {
        "long" => "bigint".to_string(),
        "timestamptz" | "timestamp" => "timestamp".to_string(),
        "uuid" | "fixed" => "string".to_string(),
        other => other.to_string(),
    }
}

fn new_snapshot_id() -> i64 {
    let (high, low) = Uuid::new_v4().as_u64_pair();
    i64::try_from((high ^ low) >> 1).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use hivecat_core::MemoryBackend;
    use hivecat_metastore::{Database, InMemoryMetastore};

    use super::*;
    use crate::metadata::{FileFormat, NestedField, PartitionSpec};

    async fn setup() -> (HiveTableOperations, Arc<MemoryBackend>, Arc<InMemoryMetastore>) {
        let storage = Arc::new(MemoryBackend::new());
        let metastore = Arc::new(InMemoryMetastore::new());
        metastore
            .create_database(Database::new("sales").with_location(Some("memory://wh/sales".into())))
            .await
            .expect("create database");
        let ops = HiveTableOperations::new(metastore.clone(), storage.clone());
        (ops, storage, metastore)
    }

    fn request(table: &str) -> CreateTableRequest {
        CreateTableRequest {
            database: "sales".into(),
            table: table.into(),
            schema: Schema::new(vec![
                NestedField::required(1, "id", "long"),
                NestedField::optional(2, "name", "string"),
            ]),
            partition_spec: PartitionSpec::unpartitioned(),
            location: format!("memory://wh/sales/{table}"),
            properties: BTreeMap::new(),
        }
    }

    fn data_file(path: &str) -> DataFile {
        DataFile {
            file_path: path.into(),
            file_format: FileFormat::Parquet,
            record_count: 10,
            file_size_in_bytes: 100,
        }
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let (ops, _, metastore) = setup().await;
        let created = ops
            .new_create_table_transaction(request("orders"), Some("alice".into()))
            .commit()
            .await
            .expect("commit");

        let record = metastore
            .get_table("sales", "orders")
            .await
            .expect("get")
            .expect("exists");
        assert!(is_iceberg_table(&record));
        assert_eq!(record.owner.as_deref(), Some("alice"));
        assert_eq!(record.data_columns[0].type_name, "bigint");

        let loaded = ops.load("sales", "orders").await.expect("load");
        assert_eq!(loaded.table_uuid, created.table_uuid);
        assert_eq!(loaded.metadata_location, created.metadata_location);
    }

    #[tokio::test]
    async fn test_create_existing_cleans_up_metadata() {
        let (ops, storage, _) = setup().await;
        ops.new_create_table_transaction(request("orders"), None)
            .commit()
            .await
            .expect("first");
        let before = storage.paths().expect("paths");

        let err = ops
            .new_create_table_transaction(request("orders"), None)
            .commit()
            .await
            .expect_err("second");
        assert!(matches!(err, IcebergError::AlreadyExists { .. }), "{err}");
        assert_eq!(storage.paths().expect("paths"), before);
    }

    #[tokio::test]
    async fn test_load_rejects_foreign_table() {
        let (ops, _, metastore) = setup().await;
        metastore
            .create_table(
                Table::new("sales", "legacy", TableType::ManagedTable),
                PrincipalPrivileges::none(),
            )
            .await
            .expect("create");

        let err = ops.load("sales", "legacy").await.expect_err("not iceberg");
        assert!(matches!(err, IcebergError::InvalidMetadata { .. }), "{err}");
        assert!(ops.load("sales", "missing").await.expect_err("missing").is_not_found());
    }

    #[tokio::test]
    async fn test_append_then_drop_data() {
        let (ops, storage, _) = setup().await;
        ops.new_create_table_transaction(request("orders"), None)
            .commit()
            .await
            .expect("create");

        let data = "memory://wh/sales/orders/data/a.parquet";
        storage
            .put(data, bytes::Bytes::from_static(b"x"), PutMode::Overwrite)
            .await
            .expect("put data");
        let appended = ops
            .append_files("sales", "orders", vec![data_file(data)])
            .await
            .expect("append");
        assert_eq!(appended.snapshots.len(), 1);
        assert_eq!(appended.metadata_log.len(), 1);

        ops.drop_table_data(&appended).await.expect("drop data");
        assert!(storage.paths().expect("paths").is_empty());
    }

    #[tokio::test]
    async fn test_commit_conflict_on_stale_base() {
        let (ops, storage, _) = setup().await;
        ops.new_create_table_transaction(request("orders"), None)
            .commit()
            .await
            .expect("create");

        let stale = ops.load("sales", "orders").await.expect("load");
        ops.update_table_comment("sales", "orders", Some("first".into()))
            .await
            .expect("first commit");
        let files_before = storage.paths().expect("paths");

        let next = stale.with_property(COMMENT_PROPERTY, Some("second".into()), 0);
        let err = ops
            .commit("sales", "orders", &stale, next)
            .await
            .expect_err("stale base");
        assert!(matches!(err, IcebergError::CommitConflict { .. }), "{err}");
        assert_eq!(storage.paths().expect("paths"), files_before);

        let current = ops.load("sales", "orders").await.expect("load");
        assert_eq!(current.comment(), Some("first"));
    }

    #[tokio::test]
    async fn test_column_comment_and_drop_validation() {
        let (ops, _, _) = setup().await;
        let mut req = request("orders");
        req.properties
            .insert("write.data.path".into(), "memory://elsewhere".into());
        ops.new_create_table_transaction(req, None)
            .commit()
            .await
            .expect("create");

        let updated = ops
            .update_column_comment("sales", "orders", "name", Some("customer name".into()))
            .await
            .expect("comment");
        let field = updated
            .current_schema()
            .and_then(|s| s.field_by_name("name"))
            .expect("field");
        assert_eq!(field.doc.as_deref(), Some("customer name"));

        let err = HiveTableOperations::validate_table_can_be_dropped(&updated)
            .expect_err("path override");
        assert!(matches!(err, IcebergError::Unsupported { .. }));
    }
}
