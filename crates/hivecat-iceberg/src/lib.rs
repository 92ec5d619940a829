//! # hivecat-iceberg
//!
//! Table-format layer for metastore-registered Iceberg tables.
//!
//! A table is a metastore record whose `metadata_location` parameter points at
//! an immutable JSON metadata file in object storage. Every schema, property or
//! snapshot change writes a new metadata file and swaps the pointer; nothing is
//! ever edited in place.
//!
//! - **Metadata**: [`TableMetadata`] snapshots, schemas, partition specs
//! - **Operations**: [`HiveTableOperations`] loads, creates, commits and drops
//! - **Transactions**: [`CreateTableTransaction`] with an optional initial append
//! - **Table handle**: [`IcebergTable`], metadata plus catalog context
//!
//! ## Storage Layout
//!
//! ```text
//! {table_location}/
//! ├── metadata/
//! │   ├── 00000-{uuid}.metadata.json   # one file per committed version
//! │   ├── snap-{snapshot_id}-{uuid}.json  # manifest lists
//! │   └── {uuid}-m0.json               # manifests
//! └── data/                            # data files
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod manifest;
pub mod metadata;
pub mod operations;
pub mod paths;
pub mod table;
pub mod transaction;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{IcebergError, IcebergResult};
    pub use crate::manifest::DataFile;
    pub use crate::metadata::{
        FileFormat, NestedField, PartitionField, PartitionSpec, Schema, Snapshot, TableMetadata,
        Transform,
    };
    pub use crate::operations::HiveTableOperations;
    pub use crate::table::IcebergTable;
    pub use crate::transaction::{CreateTableRequest, CreateTableTransaction};
}

pub use error::{IcebergError, IcebergResult};
pub use manifest::DataFile;
pub use metadata::{
    FileFormat, NestedField, PartitionField, PartitionSpec, Schema, Snapshot, TableMetadata,
    Transform,
};
pub use operations::{HiveTableOperations, is_iceberg_table};
pub use table::IcebergTable;
pub use transaction::{CreateTableRequest, CreateTableTransaction};
