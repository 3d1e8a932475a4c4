//! Cache-check gateway: the read path.
//!
//! The hot path is a single manifest lookup. On a miss the materializer is
//! triggered in the background and the reader gets a "processing" answer.
//! A reader never blocks synchronously on extraction, and never sees a
//! partial manifest because the manifest is only ever written whole.

use crate::error::{ApiError, ApiResult};
use crate::materialize;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::ACCEPT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hondana_core::{key, ChapterNumber, PageManifest};
use hondana_metadata::models::LiveChapterRow;
use hondana_metadata::ChapterRepo;
use hondana_storage::ObjectStore;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Response for a fully materialized chapter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestResponse {
    image_urls: Vec<String>,
    series_id: Uuid,
    chapter_id: Uuid,
}

impl ManifestResponse {
    fn new(manifest: PageManifest, chapter: &LiveChapterRow) -> Self {
        Self {
            image_urls: manifest.image_urls,
            series_id: chapter.series_id,
            chapter_id: chapter.chapter_id,
        }
    }
}

/// Response while materialization is in flight.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessingResponse {
    status: &'static str,
    series_id: Uuid,
    chapter_id: Uuid,
}

impl ProcessingResponse {
    fn new(chapter: &LiveChapterRow) -> Self {
        Self {
            status: "processing",
            series_id: chapter.series_id,
            chapter_id: chapter.chapter_id,
        }
    }
}

/// GET /v1/series/{slug}/chapters/{number} - read a chapter.
///
/// `Accept: text/event-stream` selects the streaming mode; anything else
/// gets a JSON status.
pub async fn read_chapter(
    State(state): State<AppState>,
    Path((slug, number)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let number: ChapterNumber = number
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid chapter number: {number}")))?;

    let chapter = state
        .metadata
        .find_live_chapter(&slug, number.value())
        .await?
        .ok_or_else(|| ApiError::NotFound("chapter not found or not available".to_string()))?;

    let manifest = load_manifest(&state.storage, &chapter.series_slug, number).await?;

    let wants_stream = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"));

    if !wants_stream {
        return Ok(match manifest {
            Some(manifest) => (
                StatusCode::OK,
                Json(ManifestResponse::new(manifest, &chapter)),
            )
                .into_response(),
            None => {
                materialize::spawn_materialization(&state, &chapter).await;
                (
                    StatusCode::ACCEPTED,
                    Json(ProcessingResponse::new(&chapter)),
                )
                    .into_response()
            }
        });
    }

    if manifest.is_none() {
        materialize::spawn_materialization(&state, &chapter).await;
    }
    Ok(stream_chapter(state, chapter, number).into_response())
}

/// Open the long-lived event channel for a chapter.
///
/// Polls manifest presence on a fixed interval up to a bounded attempt
/// count: `processing` per miss, `completed` with the manifest payload on
/// success, `error` on timeout or lookup failure. Dropping the sender
/// closes the channel deterministically in every case.
fn stream_chapter(
    state: AppState,
    chapter: LiveChapterRow,
    number: ChapterNumber,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = tokio::sync::mpsc::channel::<Event>(16);

    tokio::spawn(async move {
        let interval = state.config.server.stream_poll_interval();
        let max_attempts = state.config.server.stream_max_attempts;

        for _attempt in 0..max_attempts {
            match load_manifest(&state.storage, &chapter.series_slug, number).await {
                Ok(Some(manifest)) => {
                    let payload = ManifestResponse::new(manifest, &chapter);
                    let _ = tx.send(json_event("completed", &payload)).await;
                    return;
                }
                Ok(None) => {
                    let payload = ProcessingResponse::new(&chapter);
                    if tx.send(json_event("processing", &payload)).await.is_err() {
                        // Reader went away; stop polling.
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        series_slug = %chapter.series_slug,
                        chapter_number = %number,
                        error = %e,
                        "manifest poll failed"
                    );
                    let _ = tx
                        .send(error_event("cache lookup failed, try again later"))
                        .await;
                    return;
                }
            }
            tokio::time::sleep(interval).await;
        }

        let _ = tx
            .send(error_event("timed out waiting for materialization"))
            .await;
    });

    Sse::new(ReceiverStream::new(rx).map(Ok::<Event, Infallible>)).keep_alive(KeepAlive::default())
}

/// Look up and parse the chapter manifest, `None` on a cache miss.
async fn load_manifest(
    storage: &Arc<dyn ObjectStore>,
    slug: &str,
    number: ChapterNumber,
) -> ApiResult<Option<PageManifest>> {
    let manifest_key = key::manifest_key(slug, number);
    match storage.get(&manifest_key).await {
        Ok(object) => {
            let manifest = PageManifest::from_slice(&object.bytes).map_err(|e| {
                ApiError::Internal(format!("cached manifest {manifest_key} is unreadable: {e}"))
            })?;
            Ok(Some(manifest))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn json_event<T: Serialize>(name: &str, payload: &T) -> Event {
    let data = serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}

fn error_event(message: &str) -> Event {
    json_event("error", &serde_json::json!({ "message": message }))
}
