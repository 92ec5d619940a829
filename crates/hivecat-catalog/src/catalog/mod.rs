//! The catalog service.
//!
//! [`HiveCatalog`] holds no locks of its own. Single-record changes rely on the
//! metastore's atomic create, replace, rename and drop. Multi-record sequences
//! (a materialized view and its storage table) are ordered so that a crash
//! leaves at worst an orphaned storage table, never a view pointing at a table
//! that was never committed.
//!
//! Operations are split by object kind:
//! - [`namespace`]: databases and their locations
//! - [`table`]: table lifecycle, comments, locations, redirection
//! - [`view`]: logical views
//! - [`materialized_view`]: views backed by a storage table

mod materialized_view;
mod namespace;
mod table;
mod view;

use std::collections::BTreeMap;
use std::sync::Arc;

use hivecat_core::storage::StorageBackend;
use hivecat_iceberg::HiveTableOperations;
use hivecat_metastore::{
    Column, HiveMetastore, HivePrincipal, MetastoreError, PrincipalPrivileges, TABLE_COMMENT, Table, TableType,
};

use crate::cache::TableMetadataCache;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult, namespace_error};
use crate::identifier::{SchemaTableName, is_system_namespace};
use crate::kind::{PRESTO_QUERY_ID, PRESTO_VIEW_FLAG, RecordKind, TRINO_CREATED_BY};
use crate::session::Session;

/// Catalog of namespaces, tables, views and materialized views over a shared
/// metastore.
pub struct HiveCatalog {
    config: CatalogConfig,
    metastore: Arc<dyn HiveMetastore>,
    storage: Arc<dyn StorageBackend>,
    operations: HiveTableOperations,
    table_metadata: TableMetadataCache,
}

impl std::fmt::Debug for HiveCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HiveCatalog")
            .field("config", &self.config)
            .field("cached_tables", &self.table_metadata.len())
            .finish_non_exhaustive()
    }
}

impl HiveCatalog {
    /// Creates a catalog over a metastore and the storage its tables live in.
    #[must_use]
    pub fn new(
        config: CatalogConfig,
        metastore: Arc<dyn HiveMetastore>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let operations = HiveTableOperations::new(Arc::clone(&metastore), Arc::clone(&storage));
        Self {
            config,
            metastore,
            storage,
            operations,
            table_metadata: TableMetadataCache::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Returns the metastore.
    #[must_use]
    pub fn metastore(&self) -> &Arc<dyn HiveMetastore> {
        &self.metastore
    }

    /// Returns the table metadata cache.
    #[must_use]
    pub fn table_metadata_cache(&self) -> &TableMetadataCache {
        &self.table_metadata
    }

    /// Namespaces to scan for a listing: the filter itself (nothing for system
    /// namespaces) or every visible namespace.
    async fn namespaces_for(&self, filter: Option<&str>) -> CatalogResult<Vec<String>> {
        match filter {
            Some(namespace) if is_system_namespace(namespace) => Ok(Vec::new()),
            Some(namespace) => Ok(vec![namespace.to_string()]),
            None => self.list_namespaces().await,
        }
    }

    /// Reads a record and classifies it.
    async fn get_record(&self, name: &SchemaTableName) -> CatalogResult<Option<(Table, RecordKind)>> {
        let record = self
            .metastore
            .get_table(&name.schema, &name.table)
            .await
            .map_err(namespace_error)?;
        Ok(record.map(|table| {
            let kind = RecordKind::of(&table);
            (table, kind)
        }))
    }

    /// Lists records in the given namespaces whose comment parameter matches.
    ///
    /// Namespaces that disappear while listing contribute nothing.
    async fn list_by_comment(
        &self,
        filter: Option<&str>,
        comment: &str,
    ) -> CatalogResult<Vec<SchemaTableName>> {
        let mut names = Vec::new();
        for namespace in self.namespaces_for(filter).await? {
            let tables = match self
                .metastore
                .get_tables_with_parameter(&namespace, TABLE_COMMENT, comment)
                .await
            {
                Ok(tables) => tables,
                Err(MetastoreError::DatabaseNotFound { .. }) => continue,
                Err(err) => return Err(namespace_error(err)),
            };
            names.extend(
                tables
                    .into_iter()
                    .map(|table| SchemaTableName::new(namespace.clone(), table)),
            );
        }
        Ok(names)
    }

    /// Owner for records created by `session`.
    fn record_owner(&self, session: &Session) -> Option<String> {
        if self.config.uses_system_security() {
            None
        } else {
            Some(session.user().to_string())
        }
    }

    fn privileges(&self, session: &Session) -> PrincipalPrivileges {
        self.record_owner(session)
            .map_or_else(PrincipalPrivileges::none, PrincipalPrivileges::initial_for)
    }

    fn namespace_owner(&self, owner: &HivePrincipal) -> Option<HivePrincipal> {
        if self.config.uses_system_security() {
            None
        } else {
            Some(owner.clone())
        }
    }

    /// A virtual-view record with the parameters every view of this catalog
    /// carries.
    fn view_record(
        &self,
        session: &Session,
        name: &SchemaTableName,
        comment: &str,
        original_text: String,
        expanded_text: &str,
    ) -> Table {
        Table::new(name.schema.clone(), name.table.clone(), TableType::VirtualView)
            .with_owner(self.record_owner(session))
            .with_columns(vec![Column::new("dummy", "string")])
            .with_parameter(PRESTO_QUERY_ID, session.query_id())
            .with_parameter(PRESTO_VIEW_FLAG, "true")
            .with_parameter(TRINO_CREATED_BY, self.config.created_by())
            .with_parameter(TABLE_COMMENT, comment)
            .with_view_text(original_text, expanded_text)
    }
}

/// Namespace properties understood by [`HiveCatalog::create_namespace`].
pub const LOCATION_PROPERTY: &str = "location";

/// Splits namespace properties into the location and the remaining
/// parameters.
fn split_namespace_properties(
    properties: &BTreeMap<String, String>,
) -> (Option<String>, BTreeMap<String, String>) {
    let mut parameters = properties.clone();
    let location = parameters.remove(LOCATION_PROPERTY);
    (location, parameters)
}

fn unsupported(message: impl Into<String>) -> CatalogError {
    CatalogError::Unsupported {
        message: message.into(),
    }
}
