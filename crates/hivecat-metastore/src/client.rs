//! The metastore client contract consumed by the catalog.
//!
//! Every single-record mutation is expected to be atomic on the metastore side.
//! Reads may be served from a cache ([`crate::CachingMetastore`]) and can
//! therefore lag behind concurrent writers from other sessions; callers that
//! suspect staleness evict through [`HiveMetastore::invalidate_table`].

use async_trait::async_trait;

use crate::error::MetastoreResult;
use crate::types::{Database, HivePrincipal, PrincipalPrivileges, Table};

/// Operations on database and table records.
#[async_trait]
pub trait HiveMetastore: Send + Sync + 'static {
    /// Returns the names of all databases.
    async fn get_all_databases(&self) -> MetastoreResult<Vec<String>>;

    /// Returns a database record, or `None` when absent.
    async fn get_database(&self, name: &str) -> MetastoreResult<Option<Database>>;

    /// Creates a database record.
    async fn create_database(&self, database: Database) -> MetastoreResult<()>;

    /// Drops a database record, optionally deleting its location.
    async fn drop_database(&self, name: &str, delete_data: bool) -> MetastoreResult<()>;

    /// Renames a database.
    async fn rename_database(&self, name: &str, new_name: &str) -> MetastoreResult<()>;

    /// Replaces the owner of a database.
    async fn set_database_owner(&self, name: &str, principal: HivePrincipal)
    -> MetastoreResult<()>;

    /// Returns the names of all tables (including views) in a database.
    async fn get_all_tables(&self, database: &str) -> MetastoreResult<Vec<String>>;

    /// Returns the names of tables whose parameter `key` equals `value`.
    async fn get_tables_with_parameter(
        &self,
        database: &str,
        key: &str,
        value: &str,
    ) -> MetastoreResult<Vec<String>>;

    /// Returns a table record, or `None` when absent.
    async fn get_table(&self, database: &str, table: &str) -> MetastoreResult<Option<Table>>;

    /// Creates a table record.
    async fn create_table(
        &self,
        table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()>;

    /// Atomically replaces an existing table record.
    async fn replace_table(
        &self,
        database: &str,
        table: &str,
        new_table: Table,
        privileges: PrincipalPrivileges,
    ) -> MetastoreResult<()>;

    /// Renames a table, possibly across databases.
    async fn rename_table(
        &self,
        database: &str,
        table: &str,
        new_database: &str,
        new_table: &str,
    ) -> MetastoreResult<()>;

    /// Drops a table record, optionally deleting its location.
    async fn drop_table(&self, database: &str, table: &str, delete_data: bool)
    -> MetastoreResult<()>;

    /// Sets or clears the table comment.
    async fn comment_table(
        &self,
        database: &str,
        table: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()>;

    /// Sets or clears a column comment.
    async fn comment_column(
        &self,
        database: &str,
        table: &str,
        column: &str,
        comment: Option<String>,
    ) -> MetastoreResult<()>;

    /// Evicts any cached state for a table.
    fn invalidate_table(&self, _database: &str, _table: &str) {}
}
