//! # hivecat-core
//!
//! Core abstractions shared by the hivecat catalog crates.
//!
//! This crate provides the foundational types used across all components:
//!
//! - **Error Types**: Shared error definitions and result types
//! - **Storage Traits**: The object-storage contract used for warehouse locations
//! - **Locations**: Deterministic path joins and location validation
//! - **Retry**: A typed retry-with-backoff executor driven by an error predicate
//! - **Observability**: Logging initialization and span helpers
//!
//! ## Example
//!
//! ```rust
//! use hivecat_core::prelude::*;
//!
//! let location = join_location("memory://warehouse/sales", "orders");
//! assert_eq!(location, "memory://warehouse/sales/orders");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod location;
pub mod observability;
pub mod retry;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use hivecat_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::location::{join_location, parse_location};
    pub use crate::retry::RetryPolicy;
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, PutMode, PutOutcome, StorageBackend,
    };
}

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use location::{Location, join_location, parse_location};
pub use observability::{LogFormat, catalog_span, init_logging};
pub use retry::RetryPolicy;
pub use storage::{MemoryBackend, ObjectMeta, PutMode, PutOutcome, StorageBackend};
