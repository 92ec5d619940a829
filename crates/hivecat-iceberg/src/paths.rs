//! Path helpers for table metadata, manifests and data files.

use hivecat_core::location::join_location;
use uuid::Uuid;

/// Directory holding metadata files, relative to the table location.
pub const METADATA_DIR: &str = "metadata";

/// Directory holding data files, relative to the table location.
pub const DATA_DIR: &str = "data";

const METADATA_SUFFIX: &str = ".metadata.json";

/// Location of the metadata file for `version`.
#[must_use]
pub fn metadata_file_path(table_location: &str, version: u32) -> String {
    join_location(
        table_location,
        &format!("{METADATA_DIR}/{version:05}-{}{METADATA_SUFFIX}", Uuid::new_v4()),
    )
}

/// Location of a manifest list for a snapshot.
#[must_use]
pub fn manifest_list_path(table_location: &str, snapshot_id: i64) -> String {
    join_location(
        table_location,
        &format!("{METADATA_DIR}/snap-{snapshot_id}-{}.json", Uuid::new_v4()),
    )
}

/// Location of a new manifest.
#[must_use]
pub fn manifest_path(table_location: &str) -> String {
    join_location(
        table_location,
        &format!("{METADATA_DIR}/{}-m0.json", Uuid::new_v4()),
    )
}

/// Default location for a new data file.
#[must_use]
pub fn data_file_path(table_location: &str, extension: &str) -> String {
    join_location(
        table_location,
        &format!("{DATA_DIR}/{}.{extension}", Uuid::new_v4()),
    )
}

/// Parses the version number from a metadata file location.
///
/// Returns `None` for locations that do not follow the `NNNNN-uuid` naming.
#[must_use]
pub fn parse_metadata_version(metadata_location: &str) -> Option<u32> {
    let file_name = metadata_location.rsplit('/').next()?;
    if !file_name.ends_with(METADATA_SUFFIX) {
        return None;
    }
    let (version, _) = file_name.split_once('-')?;
    version.parse().ok()
}
