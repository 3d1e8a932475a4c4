//! Admin deletion endpoints.
//!
//! Removing a chapter or series deletes both the metadata rows and every
//! cached object under the affected chapter prefixes, so nothing keeps
//! serving from the cache after the record is gone.

use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use hondana_core::{key, ChapterNumber};
use hondana_metadata::{ChapterRepo, SeriesRepo};
use hondana_storage::ObjectStore;
use serde::Serialize;
use uuid::Uuid;

/// Deletion summary.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted_objects: usize,
}

/// DELETE /v1/admin/chapters/{chapter_id} - remove one chapter.
#[tracing::instrument(skip(state, headers))]
pub async fn delete_chapter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chapter_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    auth::require_admin(&headers, &state.config.admin)?;

    let chapter = state
        .metadata
        .get_chapter(chapter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("chapter {chapter_id} not found")))?;
    let series = state
        .metadata
        .get_series(chapter.series_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("series {} not found", chapter.series_id)))?;

    let number = ChapterNumber::new(chapter.chapter_number)?;
    let deleted = purge_chapter_prefix(&state, &series.slug, number).await?;
    state.metadata.delete_chapter(chapter_id).await?;

    tracing::info!(
        series_slug = %series.slug,
        chapter_number = %number,
        deleted_objects = deleted,
        "chapter deleted"
    );
    Ok(Json(DeleteResponse {
        deleted_objects: deleted,
    }))
}

/// DELETE /v1/admin/series/{series_id} - remove a series and all chapters.
#[tracing::instrument(skip(state, headers))]
pub async fn delete_series(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(series_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    auth::require_admin(&headers, &state.config.admin)?;

    let series = state
        .metadata
        .get_series(series_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("series {series_id} not found")))?;

    let mut deleted = 0;
    for chapter in state.metadata.list_chapters(series_id).await? {
        let number = ChapterNumber::new(chapter.chapter_number)?;
        deleted += purge_chapter_prefix(&state, &series.slug, number).await?;
    }
    // Chapter rows cascade with the series row.
    state.metadata.delete_series(series_id).await?;

    tracing::info!(
        series_slug = %series.slug,
        deleted_objects = deleted,
        "series deleted"
    );
    Ok(Json(DeleteResponse {
        deleted_objects: deleted,
    }))
}

/// Delete every cached object under one chapter's prefix.
async fn purge_chapter_prefix(
    state: &AppState,
    slug: &str,
    number: ChapterNumber,
) -> ApiResult<usize> {
    let prefix = key::chapter_prefix(slug, number);
    let keys = state.storage.list(&prefix).await?;
    if !keys.is_empty() {
        state.storage.delete(&keys).await?;
    }
    Ok(keys.len())
}
