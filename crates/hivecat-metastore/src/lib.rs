//! # hivecat-metastore
//!
//! The metastore is the shared, externally owned service of record for
//! namespace (database) and table existence and properties. This crate defines:
//!
//! - **Records**: [`Database`], [`Table`], [`Column`], principals and privileges
//! - **Contract**: the [`HiveMetastore`] async trait the catalog consumes
//! - **In-memory metastore**: a complete implementation for tests and embedding
//! - **Caching decorator**: read memoization with explicit `invalidate_table`
//!
//! Identifiers are plain strings at this layer; the catalog owns the typed
//! identifiers.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod caching;
pub mod client;
pub mod error;
pub mod memory;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::caching::CachingMetastore;
    pub use crate::client::HiveMetastore;
    pub use crate::error::{MetastoreError, MetastoreResult};
    pub use crate::memory::InMemoryMetastore;
    pub use crate::types::*;
}

pub use caching::CachingMetastore;
pub use client::HiveMetastore;
pub use error::{MetastoreError, MetastoreResult};
pub use memory::InMemoryMetastore;
pub use types::{
    Column, Database, HivePrincipal, PrincipalPrivileges, PrincipalType, TABLE_COMMENT, Table,
    TableType,
};
