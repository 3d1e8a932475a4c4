//! Bot API archive source.
//!
//! Two-step fetch against the messaging platform: the metadata endpoint
//! resolves an opaque file reference to a server-relative path, then the
//! file endpoint serves the bytes. Both payloads are validated against
//! explicit schemas at this boundary; pipeline logic never sees raw JSON.

use crate::error::{UpstreamError, UpstreamResult};
use crate::source::ArchiveSource;
use async_trait::async_trait;
use bytes::Bytes;
use hondana_core::config::UpstreamConfig;
use serde::Deserialize;
use tracing::instrument;

/// Response envelope of the metadata API's getFile call.
#[derive(Debug, Deserialize)]
pub(crate) struct FileInfoResponse {
    pub ok: bool,
    pub result: Option<FileInfo>,
    pub description: Option<String>,
}

/// File record inside a successful getFile response.
#[derive(Debug, Deserialize)]
pub(crate) struct FileInfo {
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
}

/// Archive source backed by the platform's bot API.
pub struct BotApiSource {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
    max_archive_bytes: u64,
}

impl BotApiSource {
    /// Create a source from configuration.
    pub fn new(config: &UpstreamConfig, max_archive_bytes: u64) -> UpstreamResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            max_archive_bytes,
        })
    }

    /// Resolve an archive reference to a server-relative file path.
    async fn resolve(&self, archive_ref: &str) -> UpstreamResult<String> {
        let url = format!(
            "{}/bot{}/getFile?file_id={}",
            self.api_base, self.access_token, archive_ref
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Resolve {
                archive_ref: archive_ref.to_string(),
                reason: format!("metadata API returned {}", response.status()),
            });
        }

        let info: FileInfoResponse = response.json().await?;
        if !info.ok {
            return Err(UpstreamError::Resolve {
                archive_ref: archive_ref.to_string(),
                reason: info
                    .description
                    .unwrap_or_else(|| "metadata API reported failure".to_string()),
            });
        }
        let file = info.result.ok_or_else(|| UpstreamError::Resolve {
            archive_ref: archive_ref.to_string(),
            reason: "response carried no file record".to_string(),
        })?;
        if let Some(size) = file.file_size {
            if size > self.max_archive_bytes {
                return Err(UpstreamError::TooLarge {
                    size,
                    max: self.max_archive_bytes,
                });
            }
        }
        file.file_path.ok_or_else(|| UpstreamError::Resolve {
            archive_ref: archive_ref.to_string(),
            reason: "response carried no file path".to_string(),
        })
    }
}

#[async_trait]
impl ArchiveSource for BotApiSource {
    #[instrument(skip(self))]
    async fn fetch_archive(&self, archive_ref: &str) -> UpstreamResult<Bytes> {
        let file_path = self.resolve(archive_ref).await?;

        let url = format!(
            "{}/file/bot{}/{}",
            self.api_base, self.access_token, file_path
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::Download(format!(
                "file endpoint returned {}",
                response.status()
            )));
        }

        // bytes() fails on a truncated transfer, so an incomplete download
        // can never reach extraction.
        let data = response.bytes().await?;
        if data.len() as u64 > self.max_archive_bytes {
            return Err(UpstreamError::TooLarge {
                size: data.len() as u64,
                max: self.max_archive_bytes,
            });
        }
        Ok(data)
    }
}
