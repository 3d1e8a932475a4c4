//! Ingestion gateway: the inbound webhook.
//!
//! Maps archive-announcement events to Series/Chapter records,
//! idempotently. No page extraction happens here; extraction is deferred
//! to first read. The platform retries on non-2xx, so malformed input is
//! acknowledged and discarded; only genuine transient failures (datastore
//! unavailable) surface as 5xx.

use crate::auth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use hondana_core::ChapterNumber;
use hondana_metadata::models::{ChapterRow, ChapterStatus, SeriesRow};
use hondana_metadata::{ChapterRepo, SeriesRepo};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Archive mime type announced for chapter archives.
const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Inbound archive-announcement event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEvent {
    pub topic_id: i64,
    #[serde(default)]
    pub document: Option<EventDocument>,
}

/// Document attached to an announcement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    pub file_name: String,
    pub file_id: String,
    pub mime_type: String,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
}

impl IngestResponse {
    fn accepted() -> Json<Self> {
        Json(Self { status: "accepted" })
    }
    fn ignored() -> Json<Self> {
        Json(Self { status: "ignored" })
    }
    fn duplicate() -> Json<Self> {
        Json(Self {
            status: "duplicate",
        })
    }
}

/// POST /v1/ingest/webhook - register a newly announced archive.
#[tracing::instrument(skip(state, headers, body))]
pub async fn ingest_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<IngestResponse>> {
    auth::verify_webhook_secret(&headers, &state.config.upstream)?;

    // The body is parsed after authentication so unparseable payloads can
    // still be acknowledged: a 4xx here would look transient to the
    // retrying platform and turn one bad event into a retry storm.
    let event: IngestEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable webhook payload, acknowledging");
            return Ok(IngestResponse::ignored());
        }
    };

    let Some(document) = event.document else {
        return Ok(IngestResponse::ignored());
    };
    if document.mime_type != ARCHIVE_MIME_TYPE {
        tracing::debug!(mime_type = %document.mime_type, "non-archive document, ignoring");
        return Ok(IngestResponse::ignored());
    }

    let Some(number) = ChapterNumber::from_file_name(&document.file_name) else {
        tracing::info!(
            file_name = %document.file_name,
            "no chapter number in file name, discarding event"
        );
        return Ok(IngestResponse::ignored());
    };

    let series = resolve_or_create_series(&state, event.topic_id).await?;

    if state
        .metadata
        .get_chapter_by_number(series.series_id, number.value())
        .await?
        .is_some()
    {
        tracing::debug!(
            series_slug = %series.slug,
            chapter_number = %number,
            "chapter already registered"
        );
        return Ok(IngestResponse::duplicate());
    }

    let chapter = ChapterRow {
        chapter_id: Uuid::new_v4(),
        series_id: series.series_id,
        chapter_number: number.value(),
        archive_ref: document.file_id.clone(),
        status: ChapterStatus::Pending.as_str().to_string(),
        cover_url: None,
        created_at: OffsetDateTime::now_utc(),
    };
    // INSERT OR IGNORE absorbs the race where the same event arrives twice
    // concurrently: exactly one insert wins, the other is a no-op.
    if !state.metadata.insert_chapter(&chapter).await? {
        tracing::debug!(
            series_slug = %series.slug,
            chapter_number = %number,
            archive_ref = %document.file_id,
            "duplicate delivery lost the insert race"
        );
        return Ok(IngestResponse::duplicate());
    }

    state
        .metadata
        .promote_chapter(
            chapter.chapter_id,
            state.config.server.placeholder_chapter_cover_url.as_deref(),
        )
        .await?;

    tracing::info!(
        series_slug = %series.slug,
        chapter_number = %number,
        chapter_id = %chapter.chapter_id,
        "chapter registered"
    );
    Ok(IngestResponse::accepted())
}

/// Resolve the series for a topic, creating it lazily on first sight.
///
/// A concurrent creation that loses the uniqueness race re-fetches the
/// winner instead of failing.
async fn resolve_or_create_series(state: &AppState, topic_id: i64) -> ApiResult<SeriesRow> {
    if let Some(series) = state.metadata.get_series_by_topic(topic_id).await? {
        return Ok(series);
    }

    let series = SeriesRow {
        series_id: Uuid::new_v4(),
        topic_id,
        slug: format!("serie-{topic_id}"),
        title: format!("Serie {topic_id}"),
        hidden: true,
        cover_url: None,
        created_at: OffsetDateTime::now_utc(),
    };
    match state.metadata.create_series(&series).await {
        Ok(()) => {
            tracing::info!(topic_id, slug = %series.slug, "series created");
            Ok(series)
        }
        Err(e) if e.is_constraint() => state
            .metadata
            .get_series_by_topic(topic_id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!(
                    "series for topic {topic_id} vanished after a create conflict"
                ))
            }),
        Err(e) => Err(e.into()),
    }
}
