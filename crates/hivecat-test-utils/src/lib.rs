//! Shared test utilities for hivecat integration tests.
//!
//! This crate provides:
//! - [`FailingBackend`]: in-memory storage with call recording and injected failures
//! - [`FaultyMetastore`]: metastore wrapper with call counting and injected failures
//! - [`TestCatalog`]: a catalog wired over both, plus sample objects
//!
//! # Example
//!
//! ```rust,ignore
//! use hivecat_test_utils::{MetastoreOp, TestCatalog};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let env = TestCatalog::new();
//!     env.create_namespace("sales").await;
//!     env.metastore.fail_times(MetastoreOp::GetTable, "st_", 2);
//!     // ... run test ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod metastore;
pub mod storage;

pub use fixtures::*;
pub use metastore::*;
pub use storage::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("hivecat_catalog=debug".parse().expect("valid directive"))
                .add_directive("hivecat_iceberg=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
