//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Write-time options carried onto the stored object.
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    /// Content type served back with the object.
    pub content_type: Option<String>,
    /// Cache-Control value served back with the object.
    pub cache_control: Option<String>,
}

impl PutOptions {
    /// Options for a cached page or manifest: content type plus a long
    /// cache lifetime.
    pub fn cached(content_type: &str, cache_control: &str) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            cache_control: Some(cache_control.to_string()),
        }
    }
}

/// Metadata about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Content type (if recorded or inferable).
    pub content_type: Option<String>,
    /// Cache-Control value (if recorded).
    pub cache_control: Option<String>,
}

/// A fetched object: bytes plus serving metadata.
#[derive(Clone, Debug)]
pub struct CachedObject {
    pub bytes: Bytes,
    pub meta: ObjectMeta,
}

/// Object cache abstraction.
///
/// Keys are `/`-separated relative paths. The materializer owns everything
/// under a chapter's prefix; `delete` and `list` exist for rollback and for
/// bulk cleanup when a chapter or series is removed.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content and metadata.
    ///
    /// Returns [`crate::StorageError::NotFound`] when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<CachedObject>;

    /// Put an object atomically.
    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> StorageResult<()>;

    /// Delete a batch of objects. Missing keys are not an error, so a
    /// rollback may be retried safely.
    async fn delete(&self, keys: &[String]) -> StorageResult<()>;

    /// List object keys under a prefix.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Static identifier for the backend type, used in logs.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity. Called at startup so the server never
    /// reports healthy with unreachable storage.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Content type derived from a key's extension.
///
/// The cache holds exactly two families of objects: page images and JSON
/// manifests; anything else is unknown.
pub fn infer_content_type(key: &str) -> Option<String> {
    if key.ends_with(".json") {
        return Some("application/json".to_string());
    }
    hondana_core::archive::image_content_type(key).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_the_two_object_families() {
        assert_eq!(
            infer_content_type("s/7/manifest.json").as_deref(),
            Some("application/json")
        );
        assert_eq!(
            infer_content_type("s/7/page1.jpg").as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(infer_content_type("s/7/notes.txt"), None);
    }
}
