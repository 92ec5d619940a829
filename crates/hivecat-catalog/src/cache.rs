//! Table metadata cache.
//!
//! Holds at most one metadata snapshot per table. Entries never expire; they are
//! removed only through [`TableMetadataCache::invalidate`] when the catalog
//! knows or suspects the backing record changed.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use hivecat_iceberg::TableMetadata;

use crate::identifier::SchemaTableName;
use crate::metrics;

/// Concurrent map from table identifier to its resolved metadata.
#[derive(Debug, Default)]
pub struct TableMetadataCache {
    entries: DashMap<SchemaTableName, Arc<TableMetadata>>,
}

impl TableMetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot, if any.
    #[must_use]
    pub fn get(&self, table: &SchemaTableName) -> Option<Arc<TableMetadata>> {
        self.entries.get(table).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the cached snapshot or resolves and caches it.
    ///
    /// Concurrent misses for the same table may each run `load`; the first
    /// insert wins and every caller receives that snapshot. Failed loads are
    /// not cached.
    ///
    /// # Errors
    ///
    /// Propagates the error from `load`.
    pub async fn get_or_try_load<F, Fut, E>(
        &self,
        table: &SchemaTableName,
        load: F,
    ) -> Result<Arc<TableMetadata>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TableMetadata, E>>,
    {
        if let Some(hit) = self.get(table) {
            metrics::record_cache_lookup(true);
            return Ok(hit);
        }
        metrics::record_cache_lookup(false);

        let loaded = Arc::new(load().await?);
        let winner = self
            .entries
            .entry(table.clone())
            .or_insert(loaded)
            .value()
            .clone();
        Ok(winner)
    }

    /// Evicts a table. Returns true when an entry was present.
    pub fn invalidate(&self, table: &SchemaTableName) -> bool {
        let removed = self.entries.remove(table).is_some();
        if removed {
            metrics::record_cache_invalidation();
            tracing::debug!(table = %table, "Invalidated table metadata");
        }
        removed
    }

    /// Number of cached tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use hivecat_iceberg::{PartitionSpec, Schema};

    use super::*;

    fn metadata() -> TableMetadata {
        TableMetadata::new(
            "memory://wh/t",
            Schema::new(vec![]),
            PartitionSpec::unpartitioned(),
            BTreeMap::new(),
            0,
        )
    }

    #[tokio::test]
    async fn test_loads_once_until_invalidated() {
        let cache = TableMetadataCache::new();
        let name = SchemaTableName::new("s", "t");
        let counter = AtomicU32::new(0);
        let loads = &counter;
        let load = move || async move {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::io::Error>(metadata())
        };

        let first = cache.get_or_try_load(&name, load).await.expect("load");
        let second = cache.get_or_try_load(&name, load).await.expect("hit");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        assert!(cache.invalidate(&name));
        assert!(!cache.invalidate(&name));
        let third = cache.get_or_try_load(&name, load).await.expect("reload");
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = TableMetadataCache::new();
        let name = SchemaTableName::new("s", "t");

        let err = cache
            .get_or_try_load(&name, || async { Err::<TableMetadata, _>("unavailable") })
            .await
            .expect_err("fails");
        assert_eq!(err, "unavailable");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_misses_converge() {
        let cache = Arc::new(TableMetadataCache::new());
        let name = SchemaTableName::new("s", "t");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let name = name.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_try_load(&name, || async {
                            tokio::task::yield_now().await;
                            Ok::<_, std::io::Error>(metadata())
                        })
                        .await
                        .expect("load")
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.expect("join"));
        }
        let cached = cache.get(&name).expect("cached");
        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|m| Arc::ptr_eq(m, &cached)));
    }
}
