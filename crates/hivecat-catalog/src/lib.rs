//! # hivecat-catalog
//!
//! Catalog service for a data warehouse whose objects live in a shared,
//! externally owned metastore.
//!
//! Namespaces map to metastore databases. Tables are metastore records that
//! point at immutable, versioned table metadata. Views and materialized views
//! are virtual-view records carrying an encoded definition; a materialized view
//! additionally names a separate storage table holding its data.
//!
//! ## Core Concepts
//!
//! - **[`HiveCatalog`]**: namespace, table, view and materialized-view lifecycle
//! - **[`TableMetadataCache`]**: one shared metadata snapshot per table, evicted
//!   only when the backing record is known or suspected to be stale
//! - **[`RecordKind`]**: what a raw metastore record is, decided once per read
//! - **[`CatalogConfig`]**: security mode, redirection, retry policy
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use hivecat_catalog::{CatalogConfig, HiveCatalog, Session};
//! use hivecat_core::MemoryBackend;
//! use hivecat_metastore::{HivePrincipal, InMemoryMetastore};
//!
//! # async fn example() -> hivecat_catalog::CatalogResult<()> {
//! let storage = Arc::new(MemoryBackend::new());
//! let metastore = Arc::new(InMemoryMetastore::with_storage(storage.clone()));
//! let catalog = HiveCatalog::new(CatalogConfig::default(), metastore, storage);
//!
//! let session = Session::new("alice", "query-1");
//! let properties = BTreeMap::from([("location".to_string(), "memory://wh/sales".to_string())]);
//! catalog
//!     .create_namespace(&session, "sales", &properties, &HivePrincipal::user("alice"))
//!     .await?;
//! assert_eq!(catalog.list_namespaces().await?, vec!["sales".to_string()]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identifier;
pub mod kind;
pub mod metrics;
pub mod session;
pub mod view;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cache::TableMetadataCache;
    pub use crate::catalog::HiveCatalog;
    pub use crate::config::{CatalogConfig, SecurityMode};
    pub use crate::error::{CatalogError, CatalogResult};
    pub use crate::identifier::{CatalogSchemaTableName, SchemaTableName};
    pub use crate::kind::RecordKind;
    pub use crate::session::Session;
    pub use crate::view::{
        MaterializedViewDefinition, MaterializedViewProperties, ViewColumn, ViewDefinition,
    };
}

pub use cache::TableMetadataCache;
pub use catalog::HiveCatalog;
pub use config::{CatalogConfig, SecurityMode};
pub use error::{CatalogError, CatalogResult};
pub use identifier::{CatalogSchemaTableName, SchemaTableName};
pub use kind::RecordKind;
pub use session::Session;
pub use view::{MaterializedViewDefinition, MaterializedViewProperties, ViewColumn, ViewDefinition};
