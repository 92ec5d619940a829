//! Read-through caching decorator for a metastore.
//!
//! Memoizes `get_database` and `get_table` (including negative lookups). Every
//! write made through this decorator evicts the keys it touches, but writes by
//! other processes are invisible until [`HiveMetastore::invalidate_table`] is
//! called for the affected table. That is the eventual-consistency window the
//! catalog's materialized-view retry exists to paper over.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::client::HiveMetastore;
use crate::error::MetastoreResult;
use crate::types::{Database, HivePrincipal, PrincipalPrivileges, Table};

/// Caching wrapper around another metastore.
pub struct CachingMetastore {
    delegate: Arc<dyn HiveMetastore>,
    databases: DashMap<String, Option<Database>>,
    tables: DashMap<(String, String), Option<Table>>,
}

impl CachingMetastore {
    /// Wraps `delegate` with an empty cache.
    #[must_use]
    pub fn new(delegate: Arc<dyn HiveMetastore>) -> Self {
        Self {
            delegate,
            databases: DashMap::new(),
            tables: DashMap::new(),
        }
    }

    /// Number of cached table entries (positive and negative).
    #[must_use]
    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }

    /// Drops every cached entry.
    pub fn flush(&self) {
        self.databases.clear();
        self.tables.clear();
    }

    fn evict_table(&self, database: &str, table: &str) {
        self.tables.remove(&(database.to_string(), table.to_string()));
    }

    fn evict_database(&self, name: &str) {
        self.databases.remove(name);
        self.tables.retain(|(db, _), _| db != name);
    }
}

#[async_trait]
impl HiveMetastore for CachingMetastore {
    async fn get_all_databases(&self) -> MetastoreResult<Vec<String>> {
        self.delegate.get_all_databases().await
    }

    async fn get_database(&self, name: &str) -> MetastoreResult<Option<Database>> {
        if let Some(cached) = self.databases.get(name) {
            return Ok(cached.value().clone());
        }
        let loaded = self.delegate.get_database(name).await?;
        self.databases.insert(name.to_string(), loaded.clone());
        Ok(loaded)
    }

    async fn create_database(&self, database: Database) -> MetastoreResult<()> {
        let name = database.name.clone();
        let result = self.delegate.create_database(database).await;
        self.evict_database(&name);
        result
    }

    async fn drop_database(&self, name: &str, delete_data: bool) -> MetastoreResult<()> {
        let result = self.delegate.drop_database(name, delete_data).await;
        self.evict_database(name);
        result
    }

    async fn rename_database(&self, name: &str, new_name: &str) -> MetastoreResult<()> {
        let result = self.delegate.rename_database(name, new_name).await;
        self.evict_database(name);
        self.evict_database(new_name);
        result
    }

    async fn set_database_owner(
        &self,
        name: &str,
        principal: HivePrincipal,
    ) -> MetastoreResult<()> {
        let result = self.delegate.set_database_owner(name, principal).await;
        self.databases.remove(name);
        result
    }

    async fn get_all_tables(&self, database: &str) -> MetastoreResult<Vec<String>> {
        self.delegate.get_all_tables(database).await
    }

    async fn get_tables_with_parameter(
        &self,
        database: &str,
        key: &str,
        value: &str,
    ) -> MetastoreResult<Vec<String>> {
        self.delegate
            .get_tables_with_parameter(database, key, value)
            .await
    }

    async fn get_table(&self, database: &str, table: &str) -> MetastoreResult<Option<Table>> {
        let cache_key = (database.to_string(), table.to_string());
        if let Some(cached) = self.tables.get(&cache_key) {
            return Ok(cached.value().clone());
        }
        let loaded = self.delegate.get_table(database, table).await?;
        self.tables.insert(cache_key, loaded.clone());
        Ok(loaded)
    }

    async fn create_table(
        &self,
        table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()> {
        let (database, name) = (table.database_name.clone(), table.table_name.clone());
        let result = self.delegate.create_table(table, privileges).await;
        self.evict_table(&database, &name);
        result
    }

    async fn replace_table(
        &self,
        database: &str,
        table: &str,
        new_table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()> {
        let result = self
            .delegate
            .replace_table(database, table, new_table, privileges)
            .await;
        self.evict_table(database, table);
        result
    }

    async fn rename_table(
        &self,
        database: &str,
        table: &str,
        new_database: &str,
        new_table: &str,
    ) -> MetastoreResult<()> {
        let result = self
            .delegate
            .rename_table(database, table, new_database, new_table)
            .await;
        self.evict_table(database, table);
        self.evict_table(new_database, new_table);
        result
    }

    async fn drop_table(
        &self,
        database: &str,
        table: &str,
        delete_data: bool,
    ) -> MetastoreResult<()> {
        let result = self.delegate.drop_table(database, table, delete_data).await;
        self.evict_table(database, table);
        result
    }

    async fn comment_table(
        &self,
        database: &str,
        table: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()> {
        let result = self.delegate.comment_table(database, table, comment).await;
        self.evict_table(database, table);
        result
    }

    async fn comment_column(
        &self,
        database: &str,
        table: &str,
        column: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()> {
        let result = self
            .delegate
            .comment_column(database, table, column, comment)
            .await;
        self.evict_table(database, table);
        result
    }

    fn invalidate_table(&self, database: &str, table: &str) {
        self.evict_table(database, table);
        self.delegate.invalidate_table(database, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMetastore;
    use crate::types::TableType;

    #[tokio::test]
    async fn test_external_writes_visible_only_after_invalidate() {
        let backing = Arc::new(InMemoryMetastore::new());
        backing
            .create_database(Database::new("sales"))
            .await
            .expect("db");
        let cache = CachingMetastore::new(backing.clone());

        // Negative lookup is cached.
        assert!(cache.get_table("sales", "t").await.expect("get").is_none());

        backing
            .create_table(
                Table::new("sales", "t", TableType::ManagedTable),
                PrincipalPrivileges::none(),
            )
            .await
            .expect("external create");
        assert!(cache.get_table("sales", "t").await.expect("get").is_none());

        cache.invalidate_table("sales", "t");
        assert!(cache.get_table("sales", "t").await.expect("get").is_some());
    }

    #[tokio::test]
    async fn test_own_writes_evict() {
        let backing = Arc::new(InMemoryMetastore::new());
        let cache = CachingMetastore::new(backing);
        cache
            .create_database(Database::new("sales"))
            .await
            .expect("db");
        assert!(cache.get_table("sales", "t").await.expect("get").is_none());

        cache
            .create_table(
                Table::new("sales", "t", TableType::ManagedTable),
                PrincipalPrivileges::none(),
            )
            .await
            .expect("create");
        assert!(cache.get_table("sales", "t").await.expect("get").is_some());

        cache.drop_table("sales", "t", false).await.expect("drop");
        assert!(cache.get_table("sales", "t").await.expect("get").is_none());
    }
}
