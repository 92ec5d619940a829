//! Two catalogs over one metastore: a caching reader and a direct writer.
//!
//! The reader's metastore cache hides the writer's changes until the catalog
//! invalidates the affected records. Materialized-view resolution must recover
//! from the stale view record on its own.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;

use hivecat_catalog::{CatalogConfig, HiveCatalog, SchemaTableName, Session};
use hivecat_core::MemoryBackend;
use hivecat_metastore::{CachingMetastore, HiveMetastore, HivePrincipal, InMemoryMetastore};
use hivecat_test_utils::{init_test_logging, sample_materialized_view, sample_view};

struct Pair {
    reader: HiveCatalog,
    writer: HiveCatalog,
}

async fn pair() -> Pair {
    init_test_logging();
    let storage = Arc::new(MemoryBackend::new());
    let shared: Arc<dyn HiveMetastore> = Arc::new(InMemoryMetastore::with_storage(storage.clone()));
    let cached = Arc::new(CachingMetastore::new(Arc::clone(&shared)));

    let reader = HiveCatalog::new(CatalogConfig::default(), cached, storage.clone());
    let writer = HiveCatalog::new(CatalogConfig::default(), shared, storage);

    let properties = BTreeMap::from([(
        "location".to_string(),
        "mem://warehouse/sales.db".to_string(),
    )]);
    writer
        .create_namespace(
            &session(),
            "sales",
            &properties,
            &HivePrincipal::user("alice"),
        )
        .await
        .unwrap();
    Pair { reader, writer }
}

fn session() -> Session {
    Session::new("alice", "query-1")
}

fn daily() -> SchemaTableName {
    SchemaTableName::new("sales", "daily")
}

#[tokio::test]
async fn test_reader_recovers_from_concurrent_replace() {
    let Pair { reader, writer } = pair().await;
    reader
        .create_materialized_view(&session(), &daily(), &sample_materialized_view("sales"), false, false)
        .await
        .unwrap();
    // Caches the view record in the reader's metastore cache.
    assert!(reader.get_view(&daily()).await.unwrap().is_none());

    let mut replacement = sample_materialized_view("sales");
    replacement.original_sql = "SELECT order_date, 0 AS orders FROM orders".to_string();
    writer
        .create_materialized_view(&session(), &daily(), &replacement, true, false)
        .await
        .unwrap();

    let seen = reader.get_materialized_view(&daily()).await.unwrap().unwrap();
    let current = writer.get_materialized_view(&daily()).await.unwrap().unwrap();
    assert_eq!(seen.original_sql, replacement.original_sql);
    assert_eq!(seen.storage_table, current.storage_table);
}

#[tokio::test]
async fn test_reader_sees_concurrent_drop_as_absent() {
    let Pair { reader, writer } = pair().await;
    writer
        .create_materialized_view(&session(), &daily(), &sample_materialized_view("sales"), false, false)
        .await
        .unwrap();
    assert!(reader.get_view(&daily()).await.unwrap().is_none());

    writer.drop_materialized_view(&daily()).await.unwrap();

    assert!(reader.get_materialized_view(&daily()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_views_from_other_catalog_are_visible_after_first_read() {
    let Pair { reader, writer } = pair().await;
    let recent = SchemaTableName::new("sales", "recent");

    writer
        .create_view(&session(), &recent, &sample_view("sales"), false)
        .await
        .unwrap();

    let view = reader.get_view(&recent).await.unwrap().unwrap();
    assert_eq!(view.original_sql, sample_view("sales").original_sql);
    assert_eq!(reader.list_views(Some("sales")).await.unwrap(), vec![recent]);
}
