//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Public base URL page objects are served under; manifest URLs are
    /// built against it.
    #[serde(default = "default_public_cache_base_url")]
    pub public_cache_base_url: String,
    /// Maximum parallel page uploads per materialization run.
    #[serde(default = "default_max_parallel_uploads")]
    pub max_parallel_uploads: u32,
    /// Hard timeout for one background materialization run in seconds.
    #[serde(default = "default_materialize_timeout_secs")]
    pub materialize_timeout_secs: u64,
    /// Streaming read path: interval between manifest polls in milliseconds.
    #[serde(default = "default_stream_poll_interval_ms")]
    pub stream_poll_interval_ms: u64,
    /// Streaming read path: polls before the channel reports an error and
    /// closes.
    #[serde(default = "default_stream_max_attempts")]
    pub stream_max_attempts: u32,
    /// Seconds before an in-flight materialization claim expires and a new
    /// reader may re-trigger the pipeline.
    #[serde(default = "default_flight_ttl_secs")]
    pub flight_ttl_secs: u64,
    /// Cache-Control value written on page and manifest objects.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
    /// Placeholder cover stamped on chapters at promotion, when set.
    #[serde(default)]
    pub placeholder_chapter_cover_url: Option<String>,
    /// Cap on a single decompressed page in bytes.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: u64,
    /// Cap on a downloaded archive in bytes.
    #[serde(default = "default_max_archive_bytes")]
    pub max_archive_bytes: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_public_cache_base_url() -> String {
    "http://127.0.0.1:8080/v1/cache".to_string()
}

fn default_max_parallel_uploads() -> u32 {
    8
}

fn default_materialize_timeout_secs() -> u64 {
    300
}

fn default_stream_poll_interval_ms() -> u64 {
    2000
}

fn default_stream_max_attempts() -> u32 {
    30
}

fn default_flight_ttl_secs() -> u64 {
    600
}

fn default_cache_control() -> String {
    "public, max-age=86400".to_string()
}

fn default_max_page_bytes() -> u64 {
    crate::DEFAULT_MAX_PAGE_BYTES
}

fn default_max_archive_bytes() -> u64 {
    crate::DEFAULT_MAX_ARCHIVE_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_cache_base_url: default_public_cache_base_url(),
            max_parallel_uploads: default_max_parallel_uploads(),
            materialize_timeout_secs: default_materialize_timeout_secs(),
            stream_poll_interval_ms: default_stream_poll_interval_ms(),
            stream_max_attempts: default_stream_max_attempts(),
            flight_ttl_secs: default_flight_ttl_secs(),
            cache_control: default_cache_control(),
            placeholder_chapter_cover_url: None,
            max_page_bytes: default_max_page_bytes(),
            max_archive_bytes: default_max_archive_bytes(),
        }
    }
}

impl ServerConfig {
    /// Materialization timeout as a [`Duration`].
    pub fn materialize_timeout(&self) -> Duration {
        Duration::from_secs(self.materialize_timeout_secs)
    }

    /// Streaming poll interval as a [`Duration`].
    pub fn stream_poll_interval(&self) -> Duration {
        Duration::from_millis(self.stream_poll_interval_ms)
    }

    /// Flight claim TTL as a [`Duration`].
    pub fn flight_ttl(&self) -> Duration {
        Duration::from_secs(self.flight_ttl_secs)
    }

    /// Validate invariants that would otherwise surface as runtime stalls.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_parallel_uploads == 0 {
            return Err("server.max_parallel_uploads must be at least 1".to_string());
        }
        if self.stream_max_attempts == 0 {
            return Err("server.stream_max_attempts must be at least 1".to_string());
        }
        if self.stream_poll_interval_ms == 0 {
            return Err("server.stream_poll_interval_ms must be nonzero".to_string());
        }
        Ok(())
    }
}

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Filesystem {
        /// Root directory for cached objects.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, R2, etc.).
        endpoint: Option<String>,
        /// Region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// Access key ID. Falls back to the ambient credential chain if not set.
        access_key_id: Option<String>,
        /// Secret access key. Falls back to the ambient credential chain if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs; required for MinIO and some S3-compatible
        /// services.
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/cache"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ),
            },
            _ => Ok(()),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

/// Upstream messaging-platform configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the platform's bot API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot access token used for file resolution and download.
    pub access_token: String,
    /// Shared secret expected in the webhook's secret header.
    pub webhook_secret: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl UpstreamConfig {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Admin token configuration.
///
/// Admin deletion endpoints require a bearer token whose SHA-256 hex digest
/// equals `token_hash`. Generate with: `echo -n "your-token" | sha256sum`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Pre-computed hash of the admin token (SHA-256 hex, 64 characters).
    pub token_hash: String,
}

impl AdminConfig {
    /// Create a test configuration with a deterministic token hash.
    ///
    /// **For testing only.** Hash of "test-admin-token".
    pub fn for_testing() -> Self {
        Self {
            token_hash: "17d6bfe05d1b1fb7bc499f8e3f639c7b3eda4c40f321eef8887a0c04c89a99c5"
                .to_string(),
        }
    }
}

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    pub upstream: UpstreamConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Create a configuration suitable for tests: local paths, fast polls,
    /// deterministic secrets.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                stream_poll_interval_ms: 10,
                stream_max_attempts: 100,
                ..Default::default()
            },
            storage: StorageConfig::default(),
            metadata: MetadataConfig::default(),
            upstream: UpstreamConfig {
                api_base: "http://127.0.0.1:0".to_string(),
                access_token: "test-token".to_string(),
                webhook_secret: "test-webhook-secret".to_string(),
                request_timeout_secs: 5,
            },
            admin: AdminConfig::for_testing(),
        }
    }
}
