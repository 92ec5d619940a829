//! Table operations.

use std::collections::{BTreeMap, BTreeSet};

use hivecat_core::location::{directory_prefix, join_location};
use hivecat_iceberg::{
    CreateTableRequest, CreateTableTransaction, HiveTableOperations, IcebergTable,
    PartitionSpec, Schema,
};
use hivecat_metastore::{HivePrincipal, MetastoreError};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{HiveCatalog, unsupported};
use crate::error::{CatalogError, CatalogResult, ObjectKind, namespace_error};
use crate::identifier::{CatalogSchemaTableName, SchemaTableName, is_system_namespace};
use crate::kind::RecordKind;
use crate::session::Session;

impl HiveCatalog {
    /// Lists tables and views in one namespace, or in every visible namespace.
    ///
    /// The result is a set: each identifier appears once. A namespace that does
    /// not exist lists as empty.
    ///
    /// # Errors
    ///
    /// Propagates metastore failures.
    pub async fn list_tables(&self, namespace: Option<&str>) -> CatalogResult<Vec<SchemaTableName>> {
        let mut names = BTreeSet::new();
        for schema in self.namespaces_for(namespace).await? {
            let tables = match self.metastore.get_all_tables(&schema).await {
                Ok(tables) => tables,
                Err(MetastoreError::DatabaseNotFound { .. }) => continue,
                Err(err) => return Err(namespace_error(err)),
            };
            names.extend(
                tables
                    .into_iter()
                    .map(|table| SchemaTableName::new(schema.clone(), table)),
            );
        }
        Ok(names.into_iter().collect())
    }

    /// Loads a table through the metadata cache.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] if the record is absent and
    /// [`CatalogError::TableFormat`] when its metadata cannot be resolved.
    pub async fn load_table(&self, name: &SchemaTableName) -> CatalogResult<IcebergTable> {
        let metadata = self
            .table_metadata
            .get_or_try_load(name, || self.operations.load(&name.schema, &name.table))
            .await
            .map_err(|err| ObjectKind::Table.format_error(err))?;
        Ok(IcebergTable::new(
            self.config.catalog_name.clone(),
            name.schema.clone(),
            name.table.clone(),
            metadata,
        ))
    }

    /// Begins a create-table transaction. The record owner is the session user
    /// unless system security is active. Creation errors surface on commit.
    #[must_use]
    pub fn new_create_table_transaction(
        &self,
        session: &Session,
        name: &SchemaTableName,
        schema: Schema,
        partition_spec: PartitionSpec,
        location: String,
        properties: BTreeMap<String, String>,
    ) -> CreateTableTransaction {
        let request = CreateTableRequest {
            database: name.schema.clone(),
            table: name.table.clone(),
            schema,
            partition_spec,
            location,
            properties,
        };
        self.operations
            .new_create_table_transaction(request, self.record_owner(session))
    }

    /// Drops a table and its files.
    ///
    /// The record is removed first, without asking the metastore to delete
    /// data. Data files, manifests and metadata files follow, then whatever is
    /// left in the table directory. A failure after the first step leaves
    /// orphaned files, never a record pointing at deleted files.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::TableNotFound`] if the table is absent.
    /// - [`CatalogError::Unsupported`] if the record is a view, or if the
    ///   format forbids dropping it.
    #[instrument(skip_all, fields(namespace = %name.schema, table = %name.table))]
    pub async fn drop_table(&self, name: &SchemaTableName) -> CatalogResult<()> {
        let (record, kind) = self
            .get_record(name)
            .await?
            .ok_or_else(|| ObjectKind::Table.not_found(name.clone()))?;
        if matches!(
            kind,
            RecordKind::View | RecordKind::MaterializedView { .. } | RecordKind::HiveView
        ) {
            return Err(unsupported(format!("{name} is a view and cannot be dropped as a table")));
        }

        let table = self.load_table(name).await?;
        let metadata = table.metadata();
        HiveTableOperations::validate_table_can_be_dropped(metadata)
            .map_err(|err| ObjectKind::Table.format_error(err))?;

        self.metastore
            .drop_table(&name.schema, &name.table, false)
            .await
            .map_err(|err| ObjectKind::Table.metastore_error(err))?;
        self.table_metadata.invalidate(name);

        self.operations
            .drop_table_data(metadata)
            .await
            .map_err(|err| ObjectKind::Table.format_error(err))?;

        if let Some(location) = record.location.as_deref().filter(|l| !l.is_empty()) {
            let deleted = self.storage.delete_prefix(&directory_prefix(location)).await?;
            debug!(location, deleted, "Deleted table directory");
        }
        info!("Dropped table");
        Ok(())
    }

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] or
    /// [`CatalogError::TableAlreadyExists`].
    #[instrument(skip_all, fields(table = %source, target = %target))]
    pub async fn rename_table(
        &self,
        source: &SchemaTableName,
        target: &SchemaTableName,
    ) -> CatalogResult<()> {
        self.metastore
            .rename_table(&source.schema, &source.table, &target.schema, &target.table)
            .await
            .map_err(|err| ObjectKind::Table.metastore_error(err))?;
        self.table_metadata.invalidate(source);
        self.table_metadata.invalidate(target);
        Ok(())
    }

    /// Sets or clears the table comment, first in the metastore record, then in
    /// the table metadata.
    ///
    /// The two writes are not atomic: if the second fails, the record carries
    /// the new comment while the table metadata keeps the old one.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] or propagates the failure of
    /// either write.
    #[instrument(skip_all, fields(namespace = %name.schema, table = %name.table))]
    pub async fn update_table_comment(
        &self,
        name: &SchemaTableName,
        comment: Option<String>,
    ) -> CatalogResult<()> {
        self.metastore
            .comment_table(&name.schema, &name.table, comment.clone())
            .await
            .map_err(|err| ObjectKind::Table.metastore_error(err))?;
        let result = self
            .operations
            .update_table_comment(&name.schema, &name.table, comment)
            .await;
        self.table_metadata.invalidate(name);
        result.map(|_| ()).map_err(|err| ObjectKind::Table.format_error(err))
    }

    /// Sets or clears a column comment, first in the metastore record, then in
    /// the table metadata. Not atomic, like
    /// [`update_table_comment`](Self::update_table_comment).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] or propagates the failure of
    /// either write.
    #[instrument(skip_all, fields(namespace = %name.schema, table = %name.table, column = %column))]
    pub async fn update_column_comment(
        &self,
        name: &SchemaTableName,
        column: &str,
        comment: Option<String>,
    ) -> CatalogResult<()> {
        self.metastore
            .comment_column(&name.schema, &name.table, column, comment.clone())
            .await
            .map_err(|err| ObjectKind::Table.metastore_error(err))?;
        let result = self
            .operations
            .update_column_comment(&name.schema, &name.table, column, comment)
            .await;
        self.table_metadata.invalidate(name);
        result.map(|_| ()).map_err(|err| ObjectKind::Table.format_error(err))
    }

    /// Derives the location of a new table from its namespace location.
    ///
    /// With unique table locations enabled the directory name gets a random
    /// suffix, so it never collides with files of a dropped table.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NamespaceNotFound`] if the namespace is absent.
    /// - [`CatalogError::InvalidProperty`] if it has no location.
    pub async fn default_table_location(&self, name: &SchemaTableName) -> CatalogResult<String> {
        let database = self.require_database(&name.schema).await?;
        let location = database.location.ok_or_else(|| CatalogError::InvalidProperty {
            message: format!("namespace '{}' location is not set", name.schema),
        })?;
        let directory = if self.config.unique_table_location {
            format!("{}-{}", name.table, Uuid::new_v4().simple())
        } else {
            name.table.clone()
        };
        Ok(join_location(&location, &directory))
    }

    /// Changing table ownership is not supported.
    ///
    /// # Errors
    ///
    /// Always returns [`CatalogError::Unsupported`].
    pub fn set_table_principal(
        &self,
        name: &SchemaTableName,
        _principal: HivePrincipal,
    ) -> CatalogResult<()> {
        Err(unsupported(format!(
            "This catalog does not support setting an owner on a table ({name})"
        )))
    }

    /// Returns the companion catalog that serves `name`, if it is a table of
    /// another format registered in the same metastore.
    ///
    /// A trailing `$suffix` is ignored for the lookup and kept in the result.
    ///
    /// # Errors
    ///
    /// Propagates metastore failures.
    pub async fn redirect_table(
        &self,
        name: &SchemaTableName,
    ) -> CatalogResult<Option<CatalogSchemaTableName>> {
        let Some(target) = self.config.redirect_catalog.as_deref() else {
            return Ok(None);
        };
        if is_system_namespace(&name.schema) {
            return Ok(None);
        }

        let base = name.base_table();
        let Some((_, kind)) = self.get_record(&base).await? else {
            return Ok(None);
        };
        match kind {
            RecordKind::Foreign => Ok(Some(CatalogSchemaTableName::new(target, name.clone()))),
            _ => Ok(None),
        }
    }
}
