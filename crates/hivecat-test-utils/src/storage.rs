//! Storage backend with operation recording and failure injection.
//!
//! Wraps a [`MemoryBackend`] so tests can fail selected calls by path prefix
//! and assert on the calls that were made.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use hivecat_core::error::{Error, Result};
use hivecat_core::location::Location;
use hivecat_core::storage::{
    MemoryBackend, ObjectMeta, PutMode, PutOutcome, StorageBackend,
};

/// Kind of storage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOpKind {
    /// `get`.
    Get,
    /// `put`.
    Put,
    /// `delete`.
    Delete,
    /// `list`.
    List,
    /// `head`.
    Head,
}

/// Record of a storage call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOp {
    /// Which call was made.
    pub kind: StorageOpKind,
    /// Path or prefix passed to the call.
    pub path: String,
}

#[derive(Debug, Clone)]
struct Fault {
    kind: StorageOpKind,
    prefix: String,
    remaining: Option<u32>,
}

/// In-memory storage that records calls and fails injected ones.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend {
    inner: Arc<MemoryBackend>,
    faults: Arc<Mutex<Vec<Fault>>>,
    operations: Arc<Mutex<Vec<StorageOp>>>,
}

impl FailingBackend {
    /// Creates an empty backend with no injected failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every `kind` call whose path starts with `prefix`.
    pub fn fail_always(&self, kind: StorageOpKind, prefix: impl Into<String>) {
        self.push_fault(kind, prefix.into(), None);
    }

    /// Fails the next `times` `kind` calls whose path starts with `prefix`.
    pub fn fail_times(&self, kind: StorageOpKind, prefix: impl Into<String>, times: u32) {
        if times > 0 {
            self.push_fault(kind, prefix.into(), Some(times));
        }
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.faults.lock().expect("lock").clear();
    }

    /// Returns all recorded calls.
    pub fn operations(&self) -> Vec<StorageOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns how many `kind` calls were recorded.
    pub fn count(&self, kind: StorageOpKind) -> usize {
        self.operations
            .lock()
            .expect("lock")
            .iter()
            .filter(|op| op.kind == kind)
            .count()
    }

    /// Returns all stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.inner.paths().expect("paths")
    }

    /// Returns stored paths under `prefix`, sorted.
    pub fn paths_under(&self, prefix: &str) -> Vec<String> {
        self.paths()
            .into_iter()
            .filter(|path| path.starts_with(prefix))
            .collect()
    }

    fn push_fault(&self, kind: StorageOpKind, prefix: String, remaining: Option<u32>) {
        self.faults.lock().expect("lock").push(Fault {
            kind,
            prefix,
            remaining,
        });
    }

    fn enter(&self, kind: StorageOpKind, path: &str) -> Result<()> {
        self.operations.lock().expect("lock").push(StorageOp {
            kind,
            path: path.to_string(),
        });

        let mut faults = self.faults.lock().expect("lock");
        let Some(index) = faults
            .iter()
            .position(|f| f.kind == kind && path.starts_with(&f.prefix))
        else {
            return Ok(());
        };
        if let Some(remaining) = faults[index].remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(index);
            }
        }
        Err(Error::unavailable(path, format!("injected {kind:?} failure")))
    }
}

#[async_trait::async_trait]
impl StorageBackend for FailingBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        self.enter(StorageOpKind::Get, path)?;
        self.inner.get(path).await
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        mode: PutMode,
    ) -> Result<PutOutcome> {
        self.enter(StorageOpKind::Put, path)?;
        self.inner.put(path, data, mode).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.enter(StorageOpKind::Delete, path)?;
        self.inner.delete(path).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        self.enter(StorageOpKind::List, prefix)?;
        self.inner.list(prefix).await
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        self.enter(StorageOpKind::Head, path)?;
        self.inner.head(path).await
    }

    async fn resolve_location(&self, location: &str) -> Result<Location> {
        self.inner.resolve_location(location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_times_expires() {
        let backend = FailingBackend::new();
        backend.fail_times(StorageOpKind::List, "mem://wh/a", 2);

        assert!(backend.list("mem://wh/a/").await.is_err());
        assert!(backend.list("mem://wh/b/").await.is_ok());
        assert!(backend.list("mem://wh/a/").await.is_err());
        assert!(backend.list("mem://wh/a/").await.is_ok());
        assert_eq!(backend.count(StorageOpKind::List), 4);
    }

    #[tokio::test]
    async fn test_fail_always_targets_one_kind() {
        let backend = FailingBackend::new();
        backend.fail_always(StorageOpKind::Delete, "mem://wh/");
        backend
            .put("mem://wh/x", Bytes::from_static(b"x"), PutMode::Overwrite)
            .await
            .expect("put");

        assert!(backend.delete("mem://wh/x").await.is_err());
        assert_eq!(backend.paths(), vec!["mem://wh/x".to_string()]);

        backend.clear_failures();
        backend.delete("mem://wh/x").await.expect("delete");
        assert!(backend.paths().is_empty());
    }
}
