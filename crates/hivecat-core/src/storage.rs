//! Warehouse storage as seen by the catalog.
//!
//! The catalog touches storage for four reasons: validating a namespace
//! location before persisting it, listing a namespace directory to decide
//! whether dropping it may delete data, writing and reading table-format
//! metadata files, and deleting the files of dropped tables.
//!
//! Paths are full location strings (`memory://warehouse/sales.db/orders/...`).
//! Commits never overwrite a metadata file; they create a new one with
//! [`PutMode::Create`] and swap the pointer held by the metastore.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::location::{Location, parse_location};

/// How a write treats an object already stored at the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Fail softly with [`PutOutcome::AlreadyExists`] if the path is taken.
    Create,
    /// Replace whatever is stored at the path.
    Overwrite,
}

/// What a write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The object was stored.
    Written,
    /// [`PutMode::Create`] found an existing object; nothing was written.
    AlreadyExists,
}

/// A listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Full location of the object.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
}

/// Object storage backing namespace and table locations.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads a whole object.
    ///
    /// Returns `Error::NotFound` if nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Stores `data` at `path`. A taken path under [`PutMode::Create`] is an
    /// outcome, not an error.
    async fn put(&self, path: &str, data: Bytes, mode: PutMode) -> Result<PutOutcome>;

    /// Removes an object. Missing objects are not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists objects whose path starts with `prefix`, in no particular order.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Object metadata, or `None` when absent.
    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>>;

    /// Checks that a location is well-formed and served by this backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLocation`] when the location cannot be resolved.
    async fn resolve_location(&self, location: &str) -> Result<Location> {
        parse_location(location)
    }

    /// Deletes every object under `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let objects = self.list(prefix).await?;
        for object in &objects {
            self.delete(&object.path).await?;
        }
        Ok(objects.len())
    }
}

/// Storage held in process memory.
///
/// Optionally restricted to a set of schemes, so that namespace locations on
/// other filesystems fail to resolve the way they would against a real
/// deployment.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, Bytes>>,
    schemes: Option<HashSet<String>>,
}

impl MemoryBackend {
    /// Creates an empty backend serving any scheme.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend that only resolves the given schemes.
    #[must_use]
    pub fn with_schemes<I, T>(schemes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            objects: RwLock::default(),
            schemes: Some(
                schemes
                    .into_iter()
                    .map(|scheme| scheme.into().to_ascii_lowercase())
                    .collect(),
            ),
        }
    }

    /// Every stored path, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the object map lock is poisoned.
    pub fn paths(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Bytes>>> {
        self.objects.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Bytes>>> {
        self.objects.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> Error {
    Error::Internal {
        message: "memory storage lock poisoned".into(),
    }
}

fn meta(path: &str, data: &Bytes) -> ObjectMeta {
    ObjectMeta {
        path: path.to_string(),
        size: data.len() as u64,
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        self.read()?
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("no object at {path}")))
    }

    async fn put(&self, path: &str, data: Bytes, mode: PutMode) -> Result<PutOutcome> {
        let mut objects = self.write()?;
        if mode == PutMode::Create && objects.contains_key(path) {
            return Ok(PutOutcome::AlreadyExists);
        }
        objects.insert(path.to_string(), data);
        Ok(PutOutcome::Written)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.write()?.remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        Ok(self
            .read()?
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, data)| meta(path, data))
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        Ok(self.read()?.get(path).map(|data| meta(path, data)))
    }

    async fn resolve_location(&self, location: &str) -> Result<Location> {
        let parsed = parse_location(location)?;
        match &self.schemes {
            Some(schemes) if !schemes.contains(parsed.scheme()) => Err(Error::invalid_location(
                location,
                format!("no filesystem for scheme '{}'", parsed.scheme()),
            )),
            _ => Ok(parsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = "memory://wh/sales.db/orders/metadata/00000.metadata.json";

    #[tokio::test]
    async fn test_create_never_overwrites_metadata() {
        let backend = MemoryBackend::new();

        let first = backend
            .put(METADATA, Bytes::from_static(b"{\"v\":0}"), PutMode::Create)
            .await
            .expect("first write");
        let second = backend
            .put(METADATA, Bytes::from_static(b"{\"v\":1}"), PutMode::Create)
            .await
            .expect("second write");

        assert_eq!(first, PutOutcome::Written);
        assert_eq!(second, PutOutcome::AlreadyExists);
        assert_eq!(
            backend.get(METADATA).await.expect("get"),
            Bytes::from_static(b"{\"v\":0}")
        );
    }

    #[tokio::test]
    async fn test_overwrite_replaces() {
        let backend = MemoryBackend::new();
        for body in [&b"a"[..], &b"bb"[..]] {
            backend
                .put(METADATA, Bytes::copy_from_slice(body), PutMode::Overwrite)
                .await
                .expect("write");
        }

        let meta = backend.head(METADATA).await.expect("head").expect("present");
        assert_eq!(meta.size, 2);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let backend = MemoryBackend::new();
        let err = backend.get("memory://wh/missing").await.expect_err("missing");
        assert!(err.is_not_found());
        assert!(backend.head("memory://wh/missing").await.expect("head").is_none());
        backend.delete("memory://wh/missing").await.expect("idempotent delete");
    }

    #[tokio::test]
    async fn test_delete_prefix_only_touches_directory() {
        let backend = MemoryBackend::new();
        for path in ["wh/t/a", "wh/t/b/c", "wh/t2/a"] {
            backend
                .put(path, Bytes::from_static(b"x"), PutMode::Overwrite)
                .await
                .expect("put");
        }

        let removed = backend.delete_prefix("wh/t/").await.expect("delete");
        assert_eq!(removed, 2);
        assert_eq!(backend.paths().expect("paths"), vec!["wh/t2/a".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_location_respects_scheme_allow_list() {
        let backend = MemoryBackend::with_schemes(["memory"]);
        backend
            .resolve_location("memory://wh/sales")
            .await
            .expect("served scheme");

        let err = backend
            .resolve_location("hdfs://nn/sales")
            .await
            .expect_err("unserved scheme");
        assert!(matches!(err, Error::InvalidLocation { .. }));

        let err = MemoryBackend::new()
            .resolve_location("not a uri")
            .await
            .expect_err("malformed");
        assert!(matches!(err, Error::InvalidLocation { .. }));
    }
}
