//! Series repository trait.

use crate::error::MetadataResult;
use crate::models::SeriesRow;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for series records.
#[async_trait]
pub trait SeriesRepo: Send + Sync {
    /// Create a series.
    ///
    /// Returns [`crate::MetadataError::Constraint`] on a unique violation
    /// (topic_id or slug); the ingestion gateway re-fetches the winner
    /// instead of failing.
    async fn create_series(&self, series: &SeriesRow) -> MetadataResult<()>;

    /// Get a series by ID.
    async fn get_series(&self, series_id: Uuid) -> MetadataResult<Option<SeriesRow>>;

    /// Get a series by its external topic ID.
    async fn get_series_by_topic(&self, topic_id: i64) -> MetadataResult<Option<SeriesRow>>;

    /// Get a series by slug.
    async fn get_series_by_slug(&self, slug: &str) -> MetadataResult<Option<SeriesRow>>;

    /// Delete a series; its chapters cascade.
    async fn delete_series(&self, series_id: Uuid) -> MetadataResult<()>;
}
