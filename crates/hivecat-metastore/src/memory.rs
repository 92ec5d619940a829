//! In-memory metastore.
//!
//! Implements the full [`HiveMetastore`] contract over process-local maps.
//! When constructed with a storage backend it also honours `delete_data` on
//! drops by deleting everything under the dropped object's location, the way a
//! Hive metastore removes managed directories.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use hivecat_core::location::directory_prefix;
use hivecat_core::storage::StorageBackend;

use crate::client::HiveMetastore;
use crate::error::{MetastoreError, MetastoreResult};
use crate::types::{Database, HivePrincipal, PrincipalPrivileges, TABLE_COMMENT, Table};

type TableKey = (String, String);

#[derive(Debug, Default)]
struct State {
    databases: BTreeMap<String, Database>,
    tables: BTreeMap<TableKey, StoredTable>,
}

#[derive(Debug, Clone)]
struct StoredTable {
    table: Table,
    privileges: PrincipalPrivileges,
}

/// Process-local metastore.
#[derive(Default)]
pub struct InMemoryMetastore {
    state: RwLock<State>,
    storage: Option<Arc<dyn StorageBackend>>,
}

impl std::fmt::Debug for InMemoryMetastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryMetastore")
            .field("deletes_data", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

fn key(database: &str, table: &str) -> TableKey {
    (database.to_string(), table.to_string())
}

impl InMemoryMetastore {
    /// Creates an empty metastore that never deletes data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty metastore that deletes data through `storage`.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            state: RwLock::default(),
            storage: Some(storage),
        }
    }

    /// Returns the privileges recorded when a table was created or replaced.
    ///
    /// # Errors
    ///
    /// Returns [`MetastoreError::TableNotFound`] when the table is absent.
    pub fn privileges(&self, database: &str, table: &str) -> MetastoreResult<PrincipalPrivileges> {
        self.read()?
            .tables
            .get(&key(database, table))
            .map(|stored| stored.privileges.clone())
            .ok_or_else(|| MetastoreError::table_not_found(database, table))
    }

    fn read(&self) -> MetastoreResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| MetastoreError::Unavailable {
            message: "metastore lock poisoned".to_string(),
        })
    }

    fn write(&self) -> MetastoreResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| MetastoreError::Unavailable {
            message: "metastore lock poisoned".to_string(),
        })
    }

    async fn delete_location(&self, location: Option<&str>) -> MetastoreResult<()> {
        let (Some(storage), Some(location)) = (&self.storage, location) else {
            return Ok(());
        };
        if location.is_empty() {
            return Ok(());
        }
        let removed = storage.delete_prefix(&directory_prefix(location)).await?;
        tracing::debug!(location, removed, "deleted data for dropped metastore object");
        Ok(())
    }

    fn with_table_mut<F>(&self, database: &str, table: &str, update: F) -> MetastoreResult<()>
    where
        F: FnOnce(&mut Table) -> MetastoreResult<()>,
    {
        let mut state = self.write()?;
        let stored = state
            .tables
            .get_mut(&key(database, table))
            .ok_or_else(|| MetastoreError::table_not_found(database, table))?;
        update(&mut stored.table)
    }
}

#[async_trait]
impl HiveMetastore for InMemoryMetastore {
    async fn get_all_databases(&self) -> MetastoreResult<Vec<String>> {
        Ok(self.read()?.databases.keys().cloned().collect())
    }

    async fn get_database(&self, name: &str) -> MetastoreResult<Option<Database>> {
        Ok(self.read()?.databases.get(name).cloned())
    }

    async fn create_database(&self, database: Database) -> MetastoreResult<()> {
        let mut state = self.write()?;
        if state.databases.contains_key(&database.name) {
            return Err(MetastoreError::DatabaseAlreadyExists {
                name: database.name,
            });
        }
        state.databases.insert(database.name.clone(), database);
        Ok(())
    }

    async fn drop_database(&self, name: &str, delete_data: bool) -> MetastoreResult<()> {
        let removed = self
            .write()?
            .databases
            .remove(name)
            .ok_or_else(|| MetastoreError::database_not_found(name))?;

        if delete_data {
            self.delete_location(removed.location.as_deref()).await?;
        }
        Ok(())
    }

    async fn rename_database(&self, name: &str, new_name: &str) -> MetastoreResult<()> {
        let mut state = self.write()?;
        if state.databases.contains_key(new_name) {
            return Err(MetastoreError::DatabaseAlreadyExists {
                name: new_name.to_string(),
            });
        }
        let mut database = state
            .databases
            .remove(name)
            .ok_or_else(|| MetastoreError::database_not_found(name))?;
        database.name = new_name.to_string();
        state.databases.insert(new_name.to_string(), database);

        let moved: Vec<TableKey> = state
            .tables
            .keys()
            .filter(|(db, _)| db == name)
            .cloned()
            .collect();
        for old_key in moved {
            if let Some(mut stored) = state.tables.remove(&old_key) {
                stored.table.database_name = new_name.to_string();
                state.tables.insert(key(new_name, &old_key.1), stored);
            }
        }
        Ok(())
    }

    async fn set_database_owner(
        &self,
        name: &str,
        principal: HivePrincipal,
    ) -> MetastoreResult<()> {
        let mut state = self.write()?;
        let database = state
            .databases
            .get_mut(name)
            .ok_or_else(|| MetastoreError::database_not_found(name))?;
        database.owner_type = Some(principal.principal_type);
        database.owner_name = Some(principal.name);
        Ok(())
    }

    async fn get_all_tables(&self, database: &str) -> MetastoreResult<Vec<String>> {
        let state = self.read()?;
        if !state.databases.contains_key(database) {
            return Err(MetastoreError::database_not_found(database));
        }
        Ok(state
            .tables
            .keys()
            .filter(|(db, _)| db == database)
            .map(|(_, table)| table.clone())
            .collect())
    }

    async fn get_tables_with_parameter(
        &self,
        database: &str,
        parameter_key: &str,
        value: &str,
    ) -> MetastoreResult<Vec<String>> {
        let state = self.read()?;
        if !state.databases.contains_key(database) {
            return Err(MetastoreError::database_not_found(database));
        }
        Ok(state
            .tables
            .iter()
            .filter(|((db, _), stored)| {
                db == database && stored.table.parameter(parameter_key) == Some(value)
            })
            .map(|((_, table), _)| table.clone())
            .collect())
    }

    async fn get_table(&self, database: &str, table: &str) -> MetastoreResult<Option<Table>> {
        Ok(self
            .read()?
            .tables
            .get(&key(database, table))
            .map(|stored| stored.table.clone()))
    }

    async fn create_table(
        &self,
        table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()> {
        let mut state = self.write()?;
        if !state.databases.contains_key(&table.database_name) {
            return Err(MetastoreError::database_not_found(&table.database_name));
        }
        let table_key = key(&table.database_name, &table.table_name);
        if state.tables.contains_key(&table_key) {
            return Err(MetastoreError::TableAlreadyExists {
                database: table.database_name,
                table: table.table_name,
            });
        }
        state
            .tables
            .insert(table_key, StoredTable { table, privileges });
        Ok(())
    }

    async fn replace_table(
        &self,
        database: &str,
        table: &str,
        new_table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()> {
        if new_table.database_name != database || new_table.table_name != table {
            return Err(MetastoreError::InvalidOperation {
                message: format!(
                    "replacement for {database}.{table} names {}.{}",
                    new_table.database_name, new_table.table_name
                ),
            });
        }
        let mut state = self.write()?;
        let stored = state
            .tables
            .get_mut(&key(database, table))
            .ok_or_else(|| MetastoreError::table_not_found(database, table))?;
        *stored = StoredTable {
            table: new_table,
            privileges,
        };
        Ok(())
    }

    async fn rename_table(
        &self,
        database: &str,
        table: &str,
        new_database: &str,
        new_table: &str,
    ) -> MetastoreResult<()> {
        let mut state = self.write()?;
        if !state.databases.contains_key(new_database) {
            return Err(MetastoreError::database_not_found(new_database));
        }
        let target = key(new_database, new_table);
        if state.tables.contains_key(&target) {
            return Err(MetastoreError::TableAlreadyExists {
                database: new_database.to_string(),
                table: new_table.to_string(),
            });
        }
        let mut stored = state
            .tables
            .remove(&key(database, table))
            .ok_or_else(|| MetastoreError::table_not_found(database, table))?;
        stored.table.database_name = new_database.to_string();
        stored.table.table_name = new_table.to_string();
        state.tables.insert(target, stored);
        Ok(())
    }

    async fn drop_table(
        &self,
        database: &str,
        table: &str,
        delete_data: bool,
    ) -> MetastoreResult<()> {
        let removed = self
            .write()?
            .tables
            .remove(&key(database, table))
            .ok_or_else(|| MetastoreError::table_not_found(database, table))?;

        if delete_data && !removed.table.is_view() {
            self.delete_location(removed.table.location.as_deref())
                .await?;
        }
        Ok(())
    }

    async fn comment_table(
        &self,
        database: &str,
        table: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()> {
        self.with_table_mut(database, table, |record| {
            match comment {
                Some(comment) => record.parameters.insert(TABLE_COMMENT.to_string(), comment),
                None => record.parameters.remove(TABLE_COMMENT),
            };
            Ok(())
        })
    }

    async fn comment_column(
        &self,
        database: &str,
        table: &str,
        column: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()> {
        self.with_table_mut(database, table, |record| {
            let target = record
                .data_columns
                .iter_mut()
                .chain(record.partition_columns.iter_mut())
                .find(|c| c.name == column)
                .ok_or_else(|| MetastoreError::InvalidOperation {
                    message: format!("column {column} does not exist in {database}.{table}"),
                })?;
            target.comment = comment;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, TableType};
    use bytes::Bytes;
    use hivecat_core::storage::{MemoryBackend, PutMode};

    async fn seeded() -> InMemoryMetastore {
        let metastore = InMemoryMetastore::new();
        metastore
            .create_database(Database::new("sales"))
            .await
            .expect("create db");
        metastore
            .create_table(
                Table::new("sales", "orders", TableType::ExternalTable)
                    .with_columns(vec![Column::new("id", "bigint")]),
                PrincipalPrivileges::none(),
            )
            .await
            .expect("create table");
        metastore
    }

    #[tokio::test]
    async fn test_create_table_requires_database() {
        let metastore = InMemoryMetastore::new();
        let err = metastore
            .create_table(
                Table::new("missing", "t", TableType::ManagedTable),
                PrincipalPrivileges::none(),
            )
            .await
            .expect_err("no database");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_table_rejected() {
        let metastore = seeded().await;
        let err = metastore
            .create_table(
                Table::new("sales", "orders", TableType::ManagedTable),
                PrincipalPrivileges::none(),
            )
            .await
            .expect_err("duplicate");
        assert!(matches!(err, MetastoreError::TableAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_rename_database_moves_tables() {
        let metastore = seeded().await;
        metastore
            .rename_database("sales", "revenue")
            .await
            .expect("rename");

        assert!(metastore.get_database("sales").await.expect("get").is_none());
        let table = metastore
            .get_table("revenue", "orders")
            .await
            .expect("get")
            .expect("moved");
        assert_eq!(table.database_name, "revenue");
    }

    #[tokio::test]
    async fn test_comments() {
        let metastore = seeded().await;
        metastore
            .comment_table("sales", "orders", Some("orders".into()))
            .await
            .expect("comment table");
        metastore
            .comment_column("sales", "orders", "id", Some("key".into()))
            .await
            .expect("comment column");

        let table = metastore
            .get_table("sales", "orders")
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(table.parameter(TABLE_COMMENT), Some("orders"));
        assert_eq!(table.data_columns[0].comment.as_deref(), Some("key"));

        let err = metastore
            .comment_column("sales", "orders", "nope", None)
            .await
            .expect_err("missing column");
        assert!(matches!(err, MetastoreError::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_drop_table_with_data_deletes_location_only() {
        let storage = Arc::new(MemoryBackend::new());
        let metastore = InMemoryMetastore::with_storage(storage.clone());
        metastore
            .create_database(Database::new("sales"))
            .await
            .expect("db");
        metastore
            .create_table(
                Table::new("sales", "t", TableType::ExternalTable).with_location("memory://wh/t"),
                PrincipalPrivileges::none(),
            )
            .await
            .expect("table");
        for path in ["memory://wh/t/data/a", "memory://wh/t2/data/a"] {
            storage
                .put(path, Bytes::from("x"), PutMode::Overwrite)
                .await
                .expect("put");
        }

        metastore.drop_table("sales", "t", true).await.expect("drop");

        assert_eq!(
            storage.paths().expect("paths"),
            vec!["memory://wh/t2/data/a".to_string()]
        );
    }
}
