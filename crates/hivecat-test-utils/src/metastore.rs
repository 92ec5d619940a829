//! Metastore wrapper with call counting and failure injection.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hivecat_metastore::{
    Database, HiveMetastore, HivePrincipal, InMemoryMetastore, MetastoreError, MetastoreResult,
    PrincipalPrivileges, Table,
};

/// Metastore call that can be counted or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetastoreOp {
    /// `get_table`.
    GetTable,
    /// `create_table`.
    CreateTable,
    /// `replace_table`.
    ReplaceTable,
    /// `drop_table`.
    DropTable,
    /// `drop_database`.
    DropDatabase,
    /// `invalidate_table`.
    InvalidateTable,
}

#[derive(Debug, Clone)]
struct Fault {
    op: MetastoreOp,
    table_prefix: String,
    remaining: Option<u32>,
}

/// Wraps a metastore, records the calls tests care about and fails injected
/// ones with [`MetastoreError::Unavailable`].
///
/// Faults match on the table name prefix; for database calls the database
/// name is matched instead.
#[derive(Clone)]
pub struct FaultyMetastore {
    delegate: Arc<dyn HiveMetastore>,
    faults: Arc<Mutex<Vec<Fault>>>,
    calls: Arc<Mutex<Vec<(MetastoreOp, String)>>>,
}

impl std::fmt::Debug for FaultyMetastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyMetastore")
            .field("faults", &self.faults)
            .finish_non_exhaustive()
    }
}

impl FaultyMetastore {
    /// Wraps `delegate`.
    pub fn new(delegate: Arc<dyn HiveMetastore>) -> Self {
        Self {
            delegate,
            faults: Arc::default(),
            calls: Arc::default(),
        }
    }

    /// Wraps a fresh [`InMemoryMetastore`] that is not attached to storage.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryMetastore::new()))
    }

    /// Fails every `op` call addressing a name that starts with `prefix`.
    pub fn fail_always(&self, op: MetastoreOp, prefix: impl Into<String>) {
        self.faults.lock().expect("lock").push(Fault {
            op,
            table_prefix: prefix.into(),
            remaining: None,
        });
    }

    /// Fails the next `times` matching `op` calls.
    pub fn fail_times(&self, op: MetastoreOp, prefix: impl Into<String>, times: u32) {
        if times == 0 {
            return;
        }
        self.faults.lock().expect("lock").push(Fault {
            op,
            table_prefix: prefix.into(),
            remaining: Some(times),
        });
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.faults.lock().expect("lock").clear();
    }

    /// Number of `op` calls addressing a name that starts with `prefix`.
    pub fn calls(&self, op: MetastoreOp, prefix: &str) -> usize {
        self.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|(called, name)| *called == op && name.starts_with(prefix))
            .count()
    }

    fn enter(&self, op: MetastoreOp, name: &str) -> MetastoreResult<()> {
        self.calls.lock().expect("lock").push((op, name.to_string()));

        let mut faults = self.faults.lock().expect("lock");
        let Some(index) = faults
            .iter()
            .position(|f| f.op == op && name.starts_with(&f.table_prefix))
        else {
            return Ok(());
        };
        if let Some(remaining) = faults[index].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(index);
            }
        }
        Err(MetastoreError::Unavailable {
            message: format!("injected {op:?} failure for {name}"),
        })
    }
}

#[async_trait]
impl HiveMetastore for FaultyMetastore {
    async fn get_all_databases(&self) -> MetastoreResult<Vec<String>> {
        self.delegate.get_all_databases().await
    }

    async fn get_database(&self, name: &str) -> MetastoreResult<Option<Database>> {
        self.delegate.get_database(name).await
    }

    async fn create_database(&self, database: Database) -> MetastoreResult<()> {
        self.delegate.create_database(database).await
    }

    async fn drop_database(&self, name: &str, delete_data: bool) -> MetastoreResult<()> {
        self.enter(MetastoreOp::DropDatabase, name)?;
        self.delegate.drop_database(name, delete_data).await
    }

    async fn rename_database(&self, name: &str, new_name: &str) -> MetastoreResult<()> {
        self.delegate.rename_database(name, new_name).await
    }

    async fn set_database_owner(
        &self,
        name: &str,
        principal: HivePrincipal,
    ) -> MetastoreResult<()> {
        self.delegate.set_database_owner(name, principal).await
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
        self.enter(MetastoreOp::GetTable, table)?;
        self.delegate.get_table(database, table).await
    }

    async fn create_table(
        &self,
        table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()> {
        self.enter(MetastoreOp::CreateTable, &table.table_name)?;
        self.delegate.create_table(table, privileges).await
    }

    async fn replace_table(
        &self,
        database: &str,
        table: &str,
        new_table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()> {
        self.enter(MetastoreOp::ReplaceTable, table)?;
        self.delegate
            .replace_table(database, table, new_table, privileges)
            .await
    }

    async fn rename_table(
        &self,
        database: &str,
        table: &str,
        new_database: &str,
        new_table: &str,
    ) -> MetastoreResult<()> {
        self.delegate
            .rename_table(database, table, new_database, new_table)
            .await
    }

    async fn drop_table(
        &self,
        database: &str,
        table: &str,
        delete_data: bool,
    ) -> MetastoreResult<()> {
        self.enter(MetastoreOp::DropTable, table)?;
        self.delegate.drop_table(database, table, delete_data).await
    }

    async fn comment_table(
        &self,
        database: &str,
        table: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()> {
        self.delegate.comment_table(database, table, comment).await
    }

    async fn comment_column(
        &self,
        database: &str,
        table: &str,
        column: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()> {
        self.delegate
            .comment_column(database, table, column, comment)
            .await
    }

    fn invalidate_table(&self, database: &str, table: &str) {
        self.calls
            .lock()
            .expect("lock")
            .push((MetastoreOp::InvalidateTable, table.to_string()));
        self.delegate.invalidate_table(database, table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_get_table_failures_expire() {
        let metastore = FaultyMetastore::in_memory();
        metastore.fail_times(MetastoreOp::GetTable, "st_", 1);

        let err = metastore.get_table("db", "st_1").await.expect_err("injected");
        assert!(matches!(err, MetastoreError::Unavailable { .. }));
        assert!(metastore.get_table("db", "st_1").await.expect("get").is_none());
        assert!(metastore.get_table("db", "orders").await.expect("get").is_none());

        assert_eq!(metastore.calls(MetastoreOp::GetTable, "st_"), 2);
        assert_eq!(metastore.calls(MetastoreOp::GetTable, ""), 3);
    }
}
