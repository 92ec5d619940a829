//! Catalog metrics.
//!
//! Counters complement the structured logging on the paths where the catalog
//! makes a non-fatal decision: cache use, retries and swallowed failures.

use metrics::{counter, describe_counter};

/// Table metadata cache lookups, labelled `result=hit|miss`.
pub const TABLE_METADATA_CACHE: &str = "hivecat_table_metadata_cache_total";

/// Table metadata cache invalidations.
pub const TABLE_METADATA_CACHE_INVALIDATIONS: &str =
    "hivecat_table_metadata_cache_invalidations_total";

/// Materialized-view resolution retries.
pub const MATERIALIZED_VIEW_RETRY: &str = "hivecat_materialized_view_retry_total";

/// Storage-table drops that failed and were ignored.
pub const STORAGE_TABLE_DROP_FAILURES: &str = "hivecat_storage_table_drop_failures_total";

/// Namespace location listings that failed during a namespace drop.
pub const NAMESPACE_LOCATION_CHECK_FAILURES: &str =
    "hivecat_namespace_location_check_failures_total";

/// Registers all catalog metric descriptions.
///
/// Call this once at application startup after initializing the metrics recorder.
pub fn register_metrics() {
    describe_counter!(TABLE_METADATA_CACHE, "Table metadata cache lookups by result");
    describe_counter!(
        TABLE_METADATA_CACHE_INVALIDATIONS,
        "Table metadata cache entries evicted"
    );
    describe_counter!(
        MATERIALIZED_VIEW_RETRY,
        "Materialized view resolutions retried after a concurrent removal"
    );
    describe_counter!(
        STORAGE_TABLE_DROP_FAILURES,
        "Storage table drops that failed while dropping a materialized view"
    );
    describe_counter!(
        NAMESPACE_LOCATION_CHECK_FAILURES,
        "Namespace location listings that failed during namespace drop"
    );
}

/// Records a cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(TABLE_METADATA_CACHE, "result" => result).increment(1);
}

/// Records a cache invalidation.
pub fn record_cache_invalidation() {
    counter!(TABLE_METADATA_CACHE_INVALIDATIONS).increment(1);
}

/// Records a materialized-view resolution retry.
pub fn record_materialized_view_retry() {
    counter!(MATERIALIZED_VIEW_RETRY).increment(1);
}

/// Records an ignored storage-table drop failure.
pub fn record_storage_table_drop_failure() {
    counter!(STORAGE_TABLE_DROP_FAILURES).increment(1);
}

/// Records a failed namespace location check.
pub fn record_namespace_location_check_failure() {
    counter!(NAMESPACE_LOCATION_CHECK_FAILURES).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        record_cache_lookup(true);
        record_cache_lookup(false);
        record_cache_invalidation();
        record_materialized_view_retry();
        record_storage_table_drop_failure();
        record_namespace_location_check_failure();
    }
}
