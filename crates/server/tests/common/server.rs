//! Server test utilities.

use crate::common::mocks::MockArchiveSource;
use hondana_core::config::AppConfig;
use hondana_metadata::{MetadataStore, SqliteStore};
use hondana_server::{create_router, AppState};
use hondana_storage::{FilesystemBackend, ObjectStore};
use hondana_upstream::ArchiveSource;
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub source: Arc<MockArchiveSource>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with temporary storage and an immediate mock
    /// source.
    pub async fn new() -> Self {
        Self::build(MockArchiveSource::new(), |storage| storage, |_| {}).await
    }

    /// Create a test server around a specific mock source.
    pub async fn with_source(source: Arc<MockArchiveSource>) -> Self {
        Self::build(source, |storage| storage, |_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        Self::build(MockArchiveSource::new(), |storage| storage, modifier).await
    }

    /// Create a test server whose object store is wrapped (e.g. with
    /// failure injection).
    pub async fn with_wrapped_storage<W>(source: Arc<MockArchiveSource>, wrap: W) -> Self
    where
        W: FnOnce(Arc<dyn ObjectStore>) -> Arc<dyn ObjectStore>,
    {
        Self::build(source, wrap, |_| {}).await
    }

    async fn build<W, F>(source: Arc<MockArchiveSource>, wrap: W, modifier: F) -> Self
    where
        W: FnOnce(Arc<dyn ObjectStore>) -> Arc<dyn ObjectStore>,
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let storage_path = temp_dir.path().join("cache");
        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );
        let storage = wrap(storage);

        let db_path = temp_dir.path().join("metadata.db");
        let metadata: Arc<dyn MetadataStore> = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        modifier(&mut config);

        let state = AppState::new(
            config,
            storage,
            metadata,
            source.clone() as Arc<dyn ArchiveSource>,
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            source,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Get access to the underlying object store.
    pub fn storage(&self) -> Arc<dyn ObjectStore> {
        self.state.storage.clone()
    }
}
