//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{ChapterRow, LiveChapterRow, SeriesRow};
use crate::repos::{ChapterRepo, SeriesRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: SeriesRepo + ChapterRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SeriesRepo for SqliteStore {
    async fn create_series(&self, series: &SeriesRow) -> MetadataResult<()> {
        match sqlx::query(
            r#"
            INSERT INTO series (series_id, topic_id, slug, title, hidden, cover_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(series.series_id)
        .bind(series.topic_id)
        .bind(&series.slug)
        .bind(&series.title)
        .bind(series.hidden)
        .bind(&series.cover_url)
        .bind(series.created_at)
        .execute(&self.pool)
        .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE constraint") => {
                Err(MetadataError::Constraint(format!(
                    "series with topic_id {} or slug '{}' already exists",
                    series.topic_id, series.slug
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_series(&self, series_id: Uuid) -> MetadataResult<Option<SeriesRow>> {
        let row = sqlx::query_as::<_, SeriesRow>("SELECT * FROM series WHERE series_id = ?")
            .bind(series_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_series_by_topic(&self, topic_id: i64) -> MetadataResult<Option<SeriesRow>> {
        let row = sqlx::query_as::<_, SeriesRow>("SELECT * FROM series WHERE topic_id = ?")
            .bind(topic_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_series_by_slug(&self, slug: &str) -> MetadataResult<Option<SeriesRow>> {
        let row = sqlx::query_as::<_, SeriesRow>("SELECT * FROM series WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_series(&self, series_id: Uuid) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM series WHERE series_id = ?")
            .bind(series_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "series {series_id} not found"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChapterRepo for SqliteStore {
    async fn insert_chapter(&self, chapter: &ChapterRow) -> MetadataResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO chapters
                (chapter_id, series_id, chapter_number, archive_ref, status, cover_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chapter.chapter_id)
        .bind(chapter.series_id)
        .bind(chapter.chapter_number)
        .bind(&chapter.archive_ref)
        .bind(&chapter.status)
        .bind(&chapter.cover_url)
        .bind(chapter.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_chapter(&self, chapter_id: Uuid) -> MetadataResult<Option<ChapterRow>> {
        let row = sqlx::query_as::<_, ChapterRow>("SELECT * FROM chapters WHERE chapter_id = ?")
            .bind(chapter_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_chapter_by_number(
        &self,
        series_id: Uuid,
        chapter_number: f64,
    ) -> MetadataResult<Option<ChapterRow>> {
        let row = sqlx::query_as::<_, ChapterRow>(
            "SELECT * FROM chapters WHERE series_id = ? AND chapter_number = ?",
        )
        .bind(series_id)
        .bind(chapter_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn promote_chapter(
        &self,
        chapter_id: Uuid,
        cover_url: Option<&str>,
    ) -> MetadataResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET status = 'live', cover_url = COALESCE(?, cover_url)
            WHERE chapter_id = ?
            "#,
        )
        .bind(cover_url)
        .bind(chapter_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "chapter {chapter_id} not found"
            )));
        }
        Ok(())
    }

    async fn find_live_chapter(
        &self,
        series_slug: &str,
        chapter_number: f64,
    ) -> MetadataResult<Option<LiveChapterRow>> {
        let row = sqlx::query_as::<_, LiveChapterRow>(
            r#"
            SELECT c.chapter_id, c.series_id, s.slug AS series_slug,
                   c.chapter_number, c.archive_ref
            FROM chapters c
            JOIN series s ON c.series_id = s.series_id
            WHERE s.slug = ? AND c.chapter_number = ? AND c.status = 'live'
            "#,
        )
        .bind(series_slug)
        .bind(chapter_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_chapters(&self, series_id: Uuid) -> MetadataResult<Vec<ChapterRow>> {
        let rows = sqlx::query_as::<_, ChapterRow>(
            "SELECT * FROM chapters WHERE series_id = ? ORDER BY chapter_number",
        )
        .bind(series_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_chapter(&self, chapter_id: Uuid) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM chapters WHERE chapter_id = ?")
            .bind(chapter_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "chapter {chapter_id} not found"
            )));
        }
        Ok(())
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
-- Series, keyed by the external platform's topic ID
CREATE TABLE IF NOT EXISTS series (
    series_id BLOB PRIMARY KEY,
    topic_id INTEGER NOT NULL UNIQUE,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    hidden INTEGER NOT NULL DEFAULT 1,
    cover_url TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_series_slug ON series(slug);

-- Chapters; (series_id, chapter_number) and archive_ref both guard against
-- duplicate delivery of the same announcement event
CREATE TABLE IF NOT EXISTS chapters (
    chapter_id BLOB PRIMARY KEY,
    series_id BLOB NOT NULL REFERENCES series(series_id) ON DELETE CASCADE,
    chapter_number REAL NOT NULL,
    archive_ref TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'pending',
    cover_url TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (series_id, chapter_number)
);
CREATE INDEX IF NOT EXISTS idx_chapters_series ON chapters(series_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChapterStatus;
    use tempfile::tempdir;
    use time::OffsetDateTime;

    async fn store() -> (tempfile::TempDir, SqliteStore) {
        let temp = tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("metadata.db"))
            .await
            .unwrap();
        (temp, store)
    }

    fn series(topic_id: i64) -> SeriesRow {
        SeriesRow {
            series_id: Uuid::new_v4(),
            topic_id,
            slug: format!("serie-{topic_id}"),
            title: format!("Serie {topic_id}"),
            hidden: true,
            cover_url: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn chapter(series_id: Uuid, number: f64, archive_ref: &str) -> ChapterRow {
        ChapterRow {
            chapter_id: Uuid::new_v4(),
            series_id,
            chapter_number: number,
            archive_ref: archive_ref.to_string(),
            status: ChapterStatus::Pending.as_str().to_string(),
            cover_url: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn duplicate_topic_is_a_constraint_error() {
        let (_temp, store) = store().await;
        store.create_series(&series(42)).await.unwrap();

        let err = store.create_series(&series(42)).await.unwrap_err();
        assert!(err.is_constraint());

        let winner = store.get_series_by_topic(42).await.unwrap().unwrap();
        assert_eq!(winner.slug, "serie-42");
    }

    #[tokio::test]
    async fn insert_chapter_is_idempotent() {
        let (_temp, store) = store().await;
        let s = series(1);
        store.create_series(&s).await.unwrap();

        let first = chapter(s.series_id, 7.0, "file-abc");
        assert!(store.insert_chapter(&first).await.unwrap());

        // Same (series, number), different ref: duplicate delivery.
        let dup = chapter(s.series_id, 7.0, "file-other");
        assert!(!store.insert_chapter(&dup).await.unwrap());

        // Same archive_ref under a different number: also a duplicate.
        let dup_ref = chapter(s.series_id, 8.0, "file-abc");
        assert!(!store.insert_chapter(&dup_ref).await.unwrap());

        assert_eq!(store.list_chapters(s.series_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn read_path_only_sees_live_chapters() {
        let (_temp, store) = store().await;
        let s = series(2);
        store.create_series(&s).await.unwrap();
        let c = chapter(s.series_id, 7.5, "file-7.5");
        store.insert_chapter(&c).await.unwrap();

        assert!(store
            .find_live_chapter("serie-2", 7.5)
            .await
            .unwrap()
            .is_none());

        store
            .promote_chapter(c.chapter_id, Some("https://assets/placeholder.jpg"))
            .await
            .unwrap();

        let live = store
            .find_live_chapter("serie-2", 7.5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(live.chapter_id, c.chapter_id);
        assert_eq!(live.series_slug, "serie-2");
        assert_eq!(live.archive_ref, "file-7.5");

        let row = store.get_chapter(c.chapter_id).await.unwrap().unwrap();
        assert!(row.is_live());
        assert_eq!(
            row.cover_url.as_deref(),
            Some("https://assets/placeholder.jpg")
        );
    }

    #[tokio::test]
    async fn promote_without_cover_keeps_existing() {
        let (_temp, store) = store().await;
        let s = series(3);
        store.create_series(&s).await.unwrap();
        let mut c = chapter(s.series_id, 1.0, "file-1");
        c.cover_url = Some("https://assets/original.jpg".to_string());
        store.insert_chapter(&c).await.unwrap();

        store.promote_chapter(c.chapter_id, None).await.unwrap();

        let row = store.get_chapter(c.chapter_id).await.unwrap().unwrap();
        assert_eq!(row.cover_url.as_deref(), Some("https://assets/original.jpg"));
    }

    #[tokio::test]
    async fn series_deletion_cascades_to_chapters() {
        let (_temp, store) = store().await;
        let s = series(4);
        store.create_series(&s).await.unwrap();
        let c = chapter(s.series_id, 1.0, "file-c1");
        store.insert_chapter(&c).await.unwrap();

        store.delete_series(s.series_id).await.unwrap();
        assert!(store.get_chapter(c.chapter_id).await.unwrap().is_none());
        assert!(store.get_series_by_topic(4).await.unwrap().is_none());
    }
}
