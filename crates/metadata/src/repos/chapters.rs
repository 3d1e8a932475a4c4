//! Chapter repository trait.

use crate::error::MetadataResult;
use crate::models::{ChapterRow, LiveChapterRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for chapter records.
#[async_trait]
pub trait ChapterRepo: Send + Sync {
    /// Insert a chapter, tolerating duplicates.
    ///
    /// Uses INSERT OR IGNORE so concurrent re-delivery of the same event
    /// resolves atomically. Returns `Ok(true)` when the row was inserted,
    /// `Ok(false)` when a chapter with the same (series_id, chapter_number)
    /// or archive_ref already existed.
    async fn insert_chapter(&self, chapter: &ChapterRow) -> MetadataResult<bool>;

    /// Get a chapter by ID.
    async fn get_chapter(&self, chapter_id: Uuid) -> MetadataResult<Option<ChapterRow>>;

    /// Get a chapter by its unique (series, number) pair.
    async fn get_chapter_by_number(
        &self,
        series_id: Uuid,
        chapter_number: f64,
    ) -> MetadataResult<Option<ChapterRow>>;

    /// Promote a chapter to live, optionally stamping a cover.
    ///
    /// The cover is eventually-consistent metadata; `None` leaves whatever
    /// is already recorded.
    async fn promote_chapter(
        &self,
        chapter_id: Uuid,
        cover_url: Option<&str>,
    ) -> MetadataResult<()>;

    /// Resolve the live chapter a read request names, joined with its
    /// series slug. `None` when the chapter is missing or not live.
    async fn find_live_chapter(
        &self,
        series_slug: &str,
        chapter_number: f64,
    ) -> MetadataResult<Option<LiveChapterRow>>;

    /// List all chapters of a series.
    async fn list_chapters(&self, series_id: Uuid) -> MetadataResult<Vec<ChapterRow>>;

    /// Delete a chapter.
    async fn delete_chapter(&self, chapter_id: Uuid) -> MetadataResult<()>;
}
