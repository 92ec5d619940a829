//! Pre-built catalog environments and sample objects.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use hivecat_catalog::{
    CatalogConfig, HiveCatalog, MaterializedViewDefinition, MaterializedViewProperties,
    SchemaTableName, Session, ViewColumn, ViewDefinition,
};
use hivecat_core::storage::{PutMode, StorageBackend};
use hivecat_iceberg::paths::data_file_path;
use hivecat_iceberg::{DataFile, FileFormat, NestedField, PartitionSpec, Schema, TableMetadata};
use hivecat_metastore::{HivePrincipal, InMemoryMetastore};

use crate::metastore::FaultyMetastore;
use crate::storage::FailingBackend;

/// Root location under which fixture namespaces are placed.
pub const WAREHOUSE: &str = "mem://warehouse";

/// A catalog over failure-injecting storage and metastore.
///
/// The metastore deletes data through the same storage, so injected storage
/// faults also affect drops that ask the metastore to delete data.
pub struct TestCatalog {
    /// Shared storage.
    pub storage: Arc<FailingBackend>,
    /// Metastore wrapper; the catalog talks to it directly.
    pub metastore: Arc<FaultyMetastore>,
    /// The catalog under test.
    pub catalog: HiveCatalog,
}

impl TestCatalog {
    /// Creates a catalog with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    /// Creates a catalog with `config`.
    pub fn with_config(config: CatalogConfig) -> Self {
        let storage = Arc::new(FailingBackend::new());
        let delegate = InMemoryMetastore::with_storage(storage.clone());
        let metastore = Arc::new(FaultyMetastore::new(Arc::new(delegate)));
        let catalog = HiveCatalog::new(config, metastore.clone(), storage.clone());
        Self {
            storage,
            metastore,
            catalog,
        }
    }

    /// Session for user `alice`.
    pub fn session(&self) -> Session {
        Session::new("alice", format!("query-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Location a fixture namespace is created at.
    pub fn namespace_location(namespace: &str) -> String {
        format!("{WAREHOUSE}/{namespace}.db")
    }

    /// Creates `namespace` at [`Self::namespace_location`], owned by `alice`.
    pub async fn create_namespace(&self, namespace: &str) {
        let properties = BTreeMap::from([(
            "location".to_string(),
            Self::namespace_location(namespace),
        )]);
        self.catalog
            .create_namespace(
                &self.session(),
                namespace,
                &properties,
                &HivePrincipal::user("alice"),
            )
            .await
            .expect("create namespace");
    }

    /// Creates an unpartitioned table with [`orders_schema`] and one data file,
    /// returning the committed metadata.
    pub async fn create_table(&self, name: &SchemaTableName) -> TableMetadata {
        let location = self
            .catalog
            .default_table_location(name)
            .await
            .expect("table location");
        let file = self.write_data_file(&location).await;

        let mut transaction = self.catalog.new_create_table_transaction(
            &self.session(),
            name,
            orders_schema(),
            PartitionSpec::unpartitioned(),
            location,
            BTreeMap::new(),
        );
        transaction.append_files(vec![file]);
        transaction.commit().await.expect("commit create table")
    }

    /// Writes a small data file under `table_location`.
    pub async fn write_data_file(&self, table_location: &str) -> DataFile {
        let path = data_file_path(table_location, FileFormat::Parquet.extension());
        let data = Bytes::from_static(b"PAR1fixturePAR1");
        let size = data.len() as u64;
        self.storage
            .put(&path, data, PutMode::Create)
            .await
            .expect("write data file");
        DataFile {
            file_path: path,
            file_format: FileFormat::Parquet,
            record_count: 3,
            file_size_in_bytes: size,
        }
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema with an id, a customer and an order date.
pub fn orders_schema() -> Schema {
    Schema::new(vec![
        NestedField::required(1, "order_id", "long"),
        NestedField::optional(2, "customer", "string"),
        NestedField::optional(3, "order_date", "date"),
    ])
}

/// A plain view over `orders`.
pub fn sample_view(namespace: &str) -> ViewDefinition {
    ViewDefinition {
        original_sql: "SELECT order_id, customer FROM orders".to_string(),
        catalog: Some("iceberg".to_string()),
        schema: Some(namespace.to_string()),
        columns: vec![
            ViewColumn::new("order_id", "bigint"),
            ViewColumn::new("customer", "varchar"),
        ],
        comment: None,
        owner: Some("alice".to_string()),
        run_as_invoker: false,
    }
}

/// A materialized view over `orders` partitioned by day.
pub fn sample_materialized_view(namespace: &str) -> MaterializedViewDefinition {
    MaterializedViewDefinition {
        original_sql: "SELECT order_date, count(*) AS orders FROM orders GROUP BY 1".to_string(),
        storage_table: None,
        catalog: Some("iceberg".to_string()),
        schema: Some(namespace.to_string()),
        columns: vec![
            ViewColumn::new("order_date", "date"),
            ViewColumn::new("orders", "bigint"),
        ],
        comment: Some("daily orders".to_string()),
        owner: Some("alice".to_string()),
        properties: MaterializedViewProperties {
            format: Some(FileFormat::Orc),
            partitioning: vec!["day(order_date)".to_string()],
        },
    }
}
