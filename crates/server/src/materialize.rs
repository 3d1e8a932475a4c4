//! The page materializer.
//!
//! Fetches a chapter archive, extracts its pages, uploads them to the
//! object cache concurrently, and writes the manifest as the final, atomic
//! step. The manifest is the single linearization point: a reader that
//! observes it is guaranteed every listed page object exists. Any failure
//! after the first successful upload deletes every key written in that run,
//! so a half-materialized chapter can neither be served nor leak storage.

use crate::state::AppState;
use futures::StreamExt;
use hondana_core::archive::ArchivePage;
use hondana_core::config::ServerConfig;
use hondana_core::{archive, chapter, key, ChapterNumber, PageManifest};
use hondana_metadata::models::LiveChapterRow;
use hondana_storage::{ObjectStore, PutOptions, StorageError};
use hondana_upstream::{ArchiveSource, UpstreamError};
use std::sync::Arc;
use thiserror::Error;

/// Errors terminating a materialization run.
///
/// No variant is retried internally; the absence of a manifest after a
/// failed run is itself the signal that a future read may re-trigger
/// materialization.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Resolution or download failed; nothing was written.
    #[error("archive fetch failed: {0}")]
    Fetch(#[from] UpstreamError),

    /// The archive is corrupt, holds no image entries, or no entry carries
    /// a page number; nothing was written, nothing to roll back.
    #[error("archive extraction failed: {0}")]
    Extraction(String),

    /// An upload failed mid fan-out; every key written in this run was
    /// rolled back before this error propagated.
    #[error("upload failed after {written} pages were written: {cause}")]
    PartialWrite { written: usize, cause: String },

    /// The terminal manifest write failed; page keys were rolled back.
    #[error("manifest write failed after {written} pages were written: {cause}")]
    ManifestWrite { written: usize, cause: String },
}

/// A page successfully written to the cache.
#[derive(Debug)]
struct UploadedPage {
    page_number: u32,
    key: String,
    url: String,
}

/// Claim the chapter and run the pipeline in the background.
///
/// Returns `false` when another run already holds the claim. Pipeline
/// errors are logged here, at the boundary; the triggering request was
/// already acknowledged and must never see them.
pub async fn spawn_materialization(state: &AppState, chapter: &LiveChapterRow) -> bool {
    let number = match ChapterNumber::new(chapter.chapter_number) {
        Ok(number) => number,
        Err(e) => {
            tracing::error!(
                chapter_id = %chapter.chapter_id,
                error = %e,
                "chapter row carries an unusable chapter number"
            );
            return false;
        }
    };

    let claim_key = key::manifest_key(&chapter.series_slug, number);
    if !state.flights.try_claim(&claim_key).await {
        tracing::debug!(claim = %claim_key, "materialization already in flight");
        return false;
    }

    let state = state.clone();
    let chapter = chapter.clone();
    tokio::spawn(async move {
        let timeout = state.config.server.materialize_timeout();
        let run = materialize_chapter(
            &state.storage,
            &state.source,
            &state.config.server,
            &chapter.series_slug,
            number,
            &chapter.archive_ref,
        );

        match tokio::time::timeout(timeout, run).await {
            Ok(Ok(manifest)) => {
                tracing::info!(
                    series_slug = %chapter.series_slug,
                    chapter_number = %number,
                    pages = manifest.page_count(),
                    "chapter materialized"
                );
            }
            Ok(Err(e)) => {
                tracing::error!(
                    series_slug = %chapter.series_slug,
                    chapter_number = %number,
                    archive_ref = %chapter.archive_ref,
                    error = %e,
                    "materialization failed"
                );
            }
            Err(_) => {
                tracing::error!(
                    series_slug = %chapter.series_slug,
                    chapter_number = %number,
                    archive_ref = %chapter.archive_ref,
                    timeout_secs = timeout.as_secs(),
                    "materialization timed out"
                );
            }
        }
        state.flights.release(&claim_key).await;
    });
    true
}

/// Materialize one chapter: fetch, extract, fan out uploads, write the
/// manifest.
pub async fn materialize_chapter(
    storage: &Arc<dyn ObjectStore>,
    source: &Arc<dyn ArchiveSource>,
    server: &ServerConfig,
    series_slug: &str,
    number: ChapterNumber,
    archive_ref: &str,
) -> Result<PageManifest, PipelineError> {
    let archive_bytes = source.fetch_archive(archive_ref).await?;
    tracing::debug!(
        series_slug,
        %number,
        bytes = archive_bytes.len(),
        "archive downloaded"
    );

    // Extraction is CPU- and memory-bound; keep it off the async workers.
    let max_page_bytes = server.max_page_bytes;
    let pages = tokio::task::spawn_blocking(move || {
        archive::extract_pages(&archive_bytes, max_page_bytes)
    })
    .await
    .map_err(|e| PipelineError::Extraction(format!("extraction task failed: {e}")))?
    .map_err(|e| PipelineError::Extraction(e.to_string()))?;

    // Entries without a numeric substring have no position in the chapter
    // and are skipped.
    let total = pages.len();
    let numbered: Vec<(u32, ArchivePage)> = pages
        .into_iter()
        .filter_map(|page| chapter::page_number(&page.file_name).map(|n| (n, page)))
        .collect();
    if numbered.len() < total {
        tracing::debug!(
            series_slug,
            %number,
            skipped = total - numbered.len(),
            "skipped entries without page numbers"
        );
    }
    if numbered.is_empty() {
        return Err(PipelineError::Extraction(
            "no archive entry carries a page number".to_string(),
        ));
    }

    // Concurrent upload fan-out. Each upload resolves to a result value;
    // rollback is decided on the aggregate after the join, and every key
    // that made it to the cache is recorded no matter what later entries do.
    let uploads = numbered.into_iter().map(|(page_number, page)| {
        let storage = Arc::clone(storage);
        let object_key = key::page_key(series_slug, number, &page.file_name);
        let url = key::object_url(&server.public_cache_base_url, &object_key);
        let opts = PutOptions::cached(page.content_type, &server.cache_control);
        async move {
            storage
                .put(&object_key, page.bytes, opts)
                .await
                .map(|()| UploadedPage {
                    page_number,
                    key: object_key,
                    url,
                })
        }
    });
    let results: Vec<Result<UploadedPage, StorageError>> = futures::stream::iter(uploads)
        .buffer_unordered(server.max_parallel_uploads as usize)
        .collect()
        .await;

    let mut written = Vec::new();
    let mut failure = None;
    for result in results {
        match result {
            Ok(page) => written.push(page),
            Err(e) => failure = Some(e),
        }
    }

    if let Some(cause) = failure {
        let count = written.len();
        rollback(storage, written).await;
        return Err(PipelineError::PartialWrite {
            written: count,
            cause: cause.to_string(),
        });
    }

    // Order pages numerically (1, 2, 10, not lexicographic) and write the
    // manifest strictly after every upload succeeded.
    written.sort_by(|a, b| a.page_number.cmp(&b.page_number).then(a.key.cmp(&b.key)));
    let manifest = PageManifest {
        image_urls: written.iter().map(|page| page.url.clone()).collect(),
    };

    let manifest_bytes = match manifest.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            let count = written.len();
            rollback(storage, written).await;
            return Err(PipelineError::ManifestWrite {
                written: count,
                cause: e.to_string(),
            });
        }
    };

    let manifest_key = key::manifest_key(series_slug, number);
    let opts = PutOptions::cached(
        hondana_core::manifest::MANIFEST_CONTENT_TYPE,
        &server.cache_control,
    );
    if let Err(e) = storage
        .put(&manifest_key, manifest_bytes.into(), opts)
        .await
    {
        let count = written.len();
        rollback(storage, written).await;
        return Err(PipelineError::ManifestWrite {
            written: count,
            cause: e.to_string(),
        });
    }

    Ok(manifest)
}

/// Delete every key recorded in this run.
///
/// A rollback failure leaks storage but must not mask the pipeline error;
/// it is logged with the orphaned keys instead.
async fn rollback(storage: &Arc<dyn ObjectStore>, written: Vec<UploadedPage>) {
    if written.is_empty() {
        return;
    }
    let keys: Vec<String> = written.into_iter().map(|page| page.key).collect();
    if let Err(e) = storage.delete(&keys).await {
        tracing::error!(
            error = %e,
            orphaned = ?keys,
            "rollback failed, cached objects may be orphaned"
        );
    }
}
