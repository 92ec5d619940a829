//! Materialized view operations.
//!
//! A materialized view is two records in one namespace: a virtual-view record
//! holding the encoded definition, and a storage table `st_<uuid>` named by the
//! view record's `storage_table` parameter.

use std::collections::BTreeMap;
use std::fmt;

use hivecat_core::observability::catalog_span;
use hivecat_iceberg::metadata::DEFAULT_FILE_FORMAT_PROPERTY;
use hivecat_iceberg::{NestedField, PartitionSpec, Schema};
use hivecat_metastore::Table;
use tracing::{Instrument, debug, info, instrument, warn};
use uuid::Uuid;

use super::HiveCatalog;
use crate::error::{CatalogError, CatalogResult, ObjectKind};
use crate::identifier::{CatalogSchemaTableName, SchemaTableName};
use crate::kind::{RecordKind, STORAGE_TABLE};
use crate::metrics;
use crate::session::Session;
use crate::view::{
    MATERIALIZED_VIEW_COMMENT, MATERIALIZED_VIEW_EXPANDED_TEXT_MARKER, MaterializedViewDefinition,
    MaterializedViewProperties, StoredMaterializedView, decode_materialized_view,
    encode_materialized_view,
};

/// Outcome of one failed resolution attempt.
///
/// Only `Retryable` is retried; it marks a storage table that may have been
/// removed by a concurrent drop or replace.
enum ResolveFailure {
    Retryable(CatalogError),
    Terminal(CatalogError),
}

impl ResolveFailure {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    fn into_inner(self) -> CatalogError {
        match self {
            Self::Retryable(err) | Self::Terminal(err) => err,
        }
    }
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable(err) => write!(f, "materialized view may be concurrently removed: {err}"),
            Self::Terminal(err) => write!(f, "{err}"),
        }
    }
}

impl From<CatalogError> for ResolveFailure {
    fn from(err: CatalogError) -> Self {
        Self::Terminal(err)
    }
}

impl HiveCatalog {
    /// Creates or replaces a materialized view.
    ///
    /// A fresh storage table is created and committed with an empty initial
    /// snapshot before any view record points at it. When replacing, the old
    /// storage table is dropped only after the view record points at the new
    /// one; failing to drop it leaves an orphan and a warning.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MaterializedViewAlreadyExists`] when a record
    /// exists, `replace` is false and `ignore_existing` is false, or when the
    /// existing record is not a materialized view.
    #[instrument(
        skip_all,
        fields(namespace = %name.schema, view = %name.table, replace, ignore_existing)
    )]
    pub async fn create_materialized_view(
        &self,
        session: &Session,
        name: &SchemaTableName,
        definition: &MaterializedViewDefinition,
        replace: bool,
        ignore_existing: bool,
    ) -> CatalogResult<()> {
        let existing = self.get_record(name).await?;
        if let Some((_, kind)) = &existing {
            if !replace {
                if ignore_existing {
                    debug!("Materialized view exists; ignoring");
                    return Ok(());
                }
                return Err(ObjectKind::MaterializedView.already_exists(name.clone()));
            }
            if !matches!(kind, RecordKind::MaterializedView { .. }) {
                return Err(ObjectKind::MaterializedView.already_exists(name.clone()));
            }
        }

        let storage_table = name.sibling(format!("st_{}", Uuid::new_v4().simple()));
        self.create_storage_table(session, &storage_table, definition)
            .await?;

        let record = self
            .view_record(
                session,
                name,
                MATERIALIZED_VIEW_COMMENT,
                encode_materialized_view(&StoredMaterializedView::from(definition))?,
                MATERIALIZED_VIEW_EXPANDED_TEXT_MARKER,
            )
            .with_parameter(STORAGE_TABLE, storage_table.table.clone());
        let privileges = self.privileges(session);

        let Some((previous, _)) = existing else {
            if let Err(err) = self.metastore.create_table(record, privileges).await {
                self.discard_storage_table(&storage_table).await;
                return Err(ObjectKind::MaterializedView.metastore_error(err));
            }
            info!(storage_table = %storage_table.table, "Created materialized view");
            return Ok(());
        };

        if let Err(err) = self
            .metastore
            .replace_table(&name.schema, &name.table, record, privileges)
            .await
        {
            self.discard_storage_table(&storage_table).await;
            return Err(ObjectKind::MaterializedView.metastore_error(err));
        }

        if let Some(old) = previous.parameter(STORAGE_TABLE) {
            let old = name.sibling(old);
            if let Err(err) = self.drop_storage_table(&old).await {
                metrics::record_storage_table_drop_failure();
                warn!(
                    storage_table = %old,
                    error = %err,
                    "Failed to drop replaced storage table of materialized view"
                );
            }
        }
        info!(storage_table = %storage_table.table, "Replaced materialized view");
        Ok(())
    }

    /// Best-effort removal of a storage table no view record points at.
    async fn discard_storage_table(&self, storage_table: &SchemaTableName) {
        if let Err(err) = self.drop_storage_table(storage_table).await {
            metrics::record_storage_table_drop_failure();
            warn!(
                storage_table = %storage_table,
                error = %err,
                "Failed to remove unreferenced storage table"
            );
        }
    }

    /// Drops a materialized view and its storage table.
    ///
    /// A failure to drop the storage table is logged and does not stop the
    /// view record from being removed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MaterializedViewNotFound`] if no materialized
    /// view has that name.
    #[instrument(skip_all, fields(namespace = %name.schema, view = %name.table))]
    pub async fn drop_materialized_view(&self, name: &SchemaTableName) -> CatalogResult<()> {
        let storage_table = match self.get_record(name).await? {
            Some((_, RecordKind::MaterializedView { storage_table })) => storage_table,
            _ => return Err(ObjectKind::MaterializedView.not_found(name.clone())),
        };

        if let Some(storage_table) = storage_table {
            let storage_table = name.sibling(storage_table);
            if let Err(err) = self.drop_storage_table(&storage_table).await {
                metrics::record_storage_table_drop_failure();
                warn!(
                    storage_table = %storage_table,
                    error = %err,
                    "Failed to drop storage table of materialized view"
                );
            }
        }

        self.metastore
            .drop_table(&name.schema, &name.table, true)
            .await
            .map_err(|err| ObjectKind::MaterializedView.metastore_error(err))?;
        info!("Dropped materialized view");
        Ok(())
    }

    /// Returns a materialized view definition, or `None` when no materialized
    /// view has that name.
    ///
    /// The returned properties describe the live storage table. Resolving the
    /// storage table races with concurrent drops and replaces; such failures
    /// are retried under the configured policy.
    ///
    /// # Errors
    ///
    /// Returns the last underlying failure once retries are exhausted, or the
    /// first failure that is not a storage-table resolution failure.
    pub async fn get_materialized_view(
        &self,
        name: &SchemaTableName,
    ) -> CatalogResult<Option<MaterializedViewDefinition>> {
        let span = catalog_span("get_materialized_view", &name.schema, &name.table);
        self.config
            .materialized_view_retry
            .run(
                "get_materialized_view",
                |attempt| {
                    if attempt > 1 {
                        metrics::record_materialized_view_retry();
                    }
                    self.resolve_materialized_view(name)
                },
                ResolveFailure::is_retryable,
            )
            .instrument(span)
            .await
            .map_err(ResolveFailure::into_inner)
    }

    /// Lists materialized views in one or all namespaces.
    ///
    /// # Errors
    ///
    /// Propagates metastore failures.
    pub async fn list_materialized_views(
        &self,
        namespace: Option<&str>,
    ) -> CatalogResult<Vec<SchemaTableName>> {
        self.list_by_comment(namespace, MATERIALIZED_VIEW_COMMENT)
            .await
    }

    /// Renames a materialized view. The storage table keeps its name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MaterializedViewNotFound`] or
    /// [`CatalogError::MaterializedViewAlreadyExists`].
    #[instrument(skip_all, fields(view = %source, target = %target))]
    pub async fn rename_materialized_view(
        &self,
        source: &SchemaTableName,
        target: &SchemaTableName,
    ) -> CatalogResult<()> {
        self.metastore
            .rename_table(&source.schema, &source.table, &target.schema, &target.table)
            .await
            .map_err(|err| ObjectKind::MaterializedView.metastore_error(err))
    }

    async fn resolve_materialized_view(
        &self,
        name: &SchemaTableName,
    ) -> Result<Option<MaterializedViewDefinition>, ResolveFailure> {
        let Some((record, RecordKind::MaterializedView { storage_table })) =
            self.get_record(name).await?
        else {
            return Ok(None);
        };
        let storage_table = storage_table.ok_or_else(|| {
            CatalogError::invalid_metadata(format!(
                "storage table missing in definition of materialized view {name}"
            ))
        })?;
        let stored = decode_stored(&record, name)?;

        let storage_name = name.sibling(storage_table);
        let table = match self.load_table(&storage_name).await {
            Ok(table) => table,
            Err(err) => {
                self.metastore.invalidate_table(&name.schema, &name.table);
                self.metastore
                    .invalidate_table(&storage_name.schema, &storage_name.table);
                self.table_metadata.invalidate(&storage_name);
                debug!(view = %name, storage_table = %storage_name, error = %err, "Storage table unavailable");
                return Err(ResolveFailure::Retryable(err));
            }
        };

        let format = table
            .file_format()
            .map_err(|err| ObjectKind::Table.format_error(err))?;
        let partitioning = table
            .spec()
            .filter(|spec| !spec.is_unpartitioned())
            .map(|_| table.partition_fields())
            .unwrap_or_default();

        Ok(Some(MaterializedViewDefinition {
            original_sql: stored.original_sql,
            storage_table: Some(CatalogSchemaTableName::new(
                self.config.catalog_name.clone(),
                storage_name,
            )),
            catalog: stored.catalog,
            schema: stored.schema,
            columns: stored.columns,
            comment: stored.comment,
            owner: record.owner,
            properties: MaterializedViewProperties {
                format: Some(format),
                partitioning,
            },
        }))
    }

    /// Creates the storage table and commits an empty initial snapshot.
    async fn create_storage_table(
        &self,
        session: &Session,
        storage_table: &SchemaTableName,
        definition: &MaterializedViewDefinition,
    ) -> CatalogResult<()> {
        let schema = storage_schema(definition)?;
        let partition_spec = PartitionSpec::from_rendered_fields(
            &schema,
            &definition.properties.partitioning,
        )
        .map_err(|err| CatalogError::InvalidProperty {
            message: format!("partitioning: {err}"),
        })?;
        let format = definition
            .properties
            .format
            .unwrap_or(self.config.default_file_format);
        let properties = BTreeMap::from([(
            DEFAULT_FILE_FORMAT_PROPERTY.to_string(),
            format.to_string(),
        )]);
        let location = self.default_table_location(storage_table).await?;

        let mut transaction = self.new_create_table_transaction(
            session,
            storage_table,
            schema,
            partition_spec,
            location,
            properties,
        );
        transaction.append_files(Vec::new());
        transaction
            .commit()
            .await
            .map_err(|err| ObjectKind::Table.format_error(err))?;
        debug!(storage_table = %storage_table, "Created storage table");
        Ok(())
    }

    /// Drops a storage table record and its data. A storage table that is
    /// already gone counts as dropped.
    async fn drop_storage_table(&self, storage_table: &SchemaTableName) -> CatalogResult<()> {
        let result = self
            .metastore
            .drop_table(&storage_table.schema, &storage_table.table, true)
            .await;
        self.table_metadata.invalidate(storage_table);
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(storage_table = %storage_table, "Storage table already removed");
                Ok(())
            }
            Err(err) => Err(ObjectKind::Table.metastore_error(err)),
        }
    }
}

fn decode_stored(record: &Table, name: &SchemaTableName) -> CatalogResult<StoredMaterializedView> {
    let text = record.view_original_text.as_deref().ok_or_else(|| {
        CatalogError::invalid_metadata(format!("no view original text: {name}"))
    })?;
    decode_materialized_view(text)
}

/// Storage-table schema for the view's output columns.
fn storage_schema(definition: &MaterializedViewDefinition) -> CatalogResult<Schema> {
    let mut fields = Vec::with_capacity(definition.columns.len());
    for (id, column) in (1..).zip(&definition.columns) {
        fields.push(NestedField::optional(
            id,
            column.name.clone(),
            table_format_type(&column.type_name)?,
        ));
    }
    Ok(Schema::new(fields))
}

/// Maps an engine type name to the table format's type name.
fn table_format_type(engine_type: &str) -> CatalogResult<String> {
    let normalized = engine_type.trim().to_ascii_lowercase();
    let mapped = match normalized.as_str() {
        "boolean" => "boolean",
        "tinyint" | "smallint" | "integer" | "int" => "int",
        "bigint" => "long",
        "real" => "float",
        "double" => "double",
        "date" => "date",
        "time" | "time(6)" => "time",
        "timestamp" | "timestamp(6)" => "timestamp",
        "timestamp with time zone" | "timestamp(6) with time zone" => "timestamptz",
        "varbinary" => "binary",
        "uuid" => "uuid",
        "varchar" | "string" => "string",
        other if other.starts_with("varchar(") || other.starts_with("char(") => "string",
        other if other.starts_with("decimal(") => other,
        other => {
            return Err(CatalogError::Unsupported {
                message: format!("type not supported in materialized views: {other}"),
            });
        }
    };
    Ok(mapped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mapping() {
        assert_eq!(table_format_type("BIGINT").expect("bigint"), "long");
        assert_eq!(table_format_type("varchar(10)").expect("varchar"), "string");
        assert_eq!(table_format_type("decimal(10,2)").expect("decimal"), "decimal(10,2)");
        assert_eq!(
            table_format_type("timestamp(6) with time zone").expect("tstz"),
            "timestamptz"
        );
        assert!(matches!(
            table_format_type("row(a integer)"),
            Err(CatalogError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_failure_classification() {
        let retryable = ResolveFailure::Retryable(CatalogError::invalid_metadata("gone"));
        assert!(retryable.is_retryable());
        assert!(retryable.to_string().contains("concurrently removed"));
        assert!(matches!(
            retryable.into_inner(),
            CatalogError::InvalidMetadata { .. }
        ));

        let terminal = ResolveFailure::from(CatalogError::invalid_metadata("bad"));
        assert!(!terminal.is_retryable());
    }
}
