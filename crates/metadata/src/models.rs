//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Chapter lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChapterStatus {
    /// Registered by the ingestion gateway, not yet announced to readers.
    Pending,
    /// Visible to the read path; pages materialize lazily on first read.
    Live,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Live => "live",
        }
    }
}

/// Series record, created lazily on the first ingestion event that
/// references an unseen topic.
#[derive(Debug, Clone, FromRow)]
pub struct SeriesRow {
    pub series_id: Uuid,
    /// Stable join key from the external messaging platform.
    pub topic_id: i64,
    pub slug: String,
    pub title: String,
    /// New series start hidden until curated.
    pub hidden: bool,
    pub cover_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Chapter record. Unique on (series_id, chapter_number) and on
/// archive_ref; both guard against duplicate delivery of the same event.
#[derive(Debug, Clone, FromRow)]
pub struct ChapterRow {
    pub chapter_id: Uuid,
    pub series_id: Uuid,
    pub chapter_number: f64,
    /// Opaque external file handle the archive is fetched by.
    pub archive_ref: String,
    pub status: String,
    pub cover_url: Option<String>,
    pub created_at: OffsetDateTime,
}

impl ChapterRow {
    /// Whether the chapter is visible to readers.
    pub fn is_live(&self) -> bool {
        self.status == ChapterStatus::Live.as_str()
    }
}

/// Join row the read path resolves a request against.
#[derive(Debug, Clone, FromRow)]
pub struct LiveChapterRow {
    pub chapter_id: Uuid,
    pub series_id: Uuid,
    pub series_slug: String,
    pub chapter_number: f64,
    pub archive_ref: String,
}
