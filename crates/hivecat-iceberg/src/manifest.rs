//! Manifests and manifest lists.
//!
//! Both are stored as JSON next to the metadata files. A manifest list names the
//! manifests of one snapshot; a manifest names data files.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{IcebergError, IcebergResult};
use crate::metadata::FileFormat;

/// A data file added by an append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    /// Full location of the file.
    #[serde(rename = "file-path")]
    pub file_path: String,
    /// File format.
    #[serde(rename = "file-format")]
    pub file_format: FileFormat,
    /// Number of records in the file.
    #[serde(rename = "record-count")]
    pub record_count: u64,
    /// File size in bytes.
    #[serde(rename = "file-size-in-bytes")]
    pub file_size_in_bytes: u64,
}

/// Manifest content: the data files added by one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Snapshot that added these files.
    #[serde(rename = "added-snapshot-id")]
    pub added_snapshot_id: i64,
    /// Data files.
    #[serde(default)]
    pub files: Vec<DataFile>,
}

/// A manifest referenced from a manifest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Manifest location.
    #[serde(rename = "manifest-path")]
    pub manifest_path: String,
    /// Snapshot that added the manifest.
    #[serde(rename = "added-snapshot-id")]
    pub added_snapshot_id: i64,
    /// Number of data files in the manifest.
    #[serde(rename = "added-files-count")]
    pub added_files_count: u64,
    /// Number of rows in those files.
    #[serde(rename = "added-rows-count")]
    pub added_rows_count: u64,
}

/// All manifests visible in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestList {
    /// Manifests, oldest first.
    #[serde(default)]
    pub manifests: Vec<ManifestFile>,
}

pub(crate) fn encode<T: Serialize>(value: &T) -> IcebergResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|err| IcebergError::invalid_metadata(err.to_string()))
}

pub(crate) fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8], path: &str) -> IcebergResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|err| IcebergError::invalid_metadata(format!("{path}: {err}")))
}
