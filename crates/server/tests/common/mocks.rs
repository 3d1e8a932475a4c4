//! Test doubles for the archive source and the object store.

use async_trait::async_trait;
use bytes::Bytes;
use hondana_storage::{CachedObject, ObjectStore, PutOptions, StorageError, StorageResult};
use hondana_upstream::{ArchiveSource, UpstreamError, UpstreamResult};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// In-memory archive source.
///
/// Serves registered archives, counts fetches, and can simulate download
/// failures or hold fetches at a gate so tests can observe the in-flight
/// window.
pub struct MockArchiveSource {
    archives: Mutex<HashMap<String, Bytes>>,
    fail_download: Mutex<HashSet<String>>,
    gate: Option<Semaphore>,
    fetches: AtomicUsize,
}

#[allow(dead_code)]
impl MockArchiveSource {
    /// Source that serves fetches immediately.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            archives: Mutex::new(HashMap::new()),
            fail_download: Mutex::new(HashSet::new()),
            gate: None,
            fetches: AtomicUsize::new(0),
        })
    }

    /// Source whose fetches block until [`Self::release_one`] is called.
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            archives: Mutex::new(HashMap::new()),
            fail_download: Mutex::new(HashSet::new()),
            gate: Some(Semaphore::new(0)),
            fetches: AtomicUsize::new(0),
        })
    }

    /// Register an archive behind a reference.
    pub fn insert(&self, archive_ref: &str, bytes: Vec<u8>) {
        self.archives
            .lock()
            .unwrap()
            .insert(archive_ref.to_string(), Bytes::from(bytes));
    }

    /// Make fetches of `archive_ref` fail like a broken transfer.
    pub fn fail_download(&self, archive_ref: &str) {
        self.fail_download
            .lock()
            .unwrap()
            .insert(archive_ref.to_string());
    }

    /// Let one gated fetch proceed.
    pub fn release_one(&self) {
        self.gate
            .as_ref()
            .expect("source is not gated")
            .add_permits(1);
    }

    /// Number of fetch attempts observed.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveSource for MockArchiveSource {
    async fn fetch_archive(&self, archive_ref: &str) -> UpstreamResult<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        if self.fail_download.lock().unwrap().contains(archive_ref) {
            return Err(UpstreamError::Download(
                "upstream returned 500".to_string(),
            ));
        }
        self.archives
            .lock()
            .unwrap()
            .get(archive_ref)
            .cloned()
            .ok_or_else(|| UpstreamError::Resolve {
                archive_ref: archive_ref.to_string(),
                reason: "no such file".to_string(),
            })
    }
}

/// Object store wrapper that fails puts for keys containing a marker,
/// leaving everything else to the inner backend. Forces the mid-fan-out
/// failure the rollback path exists for.
pub struct FlakyStore {
    inner: Arc<dyn ObjectStore>,
    fail_substring: String,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn wrapping(inner: Arc<dyn ObjectStore>, fail_substring: &str) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_substring: fail_substring.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<CachedObject> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<()> {
        if key.contains(&self.fail_substring) {
            return Err(StorageError::Io(std::io::Error::other(
                "injected upload failure",
            )));
        }
        self.inner.put(key, data, opts).await
    }

    async fn delete(&self, keys: &[String]) -> StorageResult<()> {
        self.inner.delete(keys).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
