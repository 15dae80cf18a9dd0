//! Video repository

use crate::models::{VideoMetadata, VideoRecord};
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository over the `youtube_videos` table
#[derive(Debug, Clone)]
pub struct VideoRepository {
    pool: SqlitePool,
}

impl VideoRepository {
    /// Create a repository on an open pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a video or overwrite its mutable attributes
    ///
    /// Keyed by `video_id`; row identity and `created_at` survive updates.
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    pub async fn upsert(&self, meta: &VideoMetadata) -> Result<VideoRecord, sqlx::Error> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, VideoRecord>(
            "INSERT INTO youtube_videos (video_id, title, views, likes, comments, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(video_id) DO UPDATE SET
                 title = excluded.title,
                 views = excluded.views,
                 likes = excluded.likes,
                 comments = excluded.comments,
                 updated_at = excluded.updated_at
             RETURNING video_id, title, views, likes, comments, created_at, updated_at",
        )
        .bind(meta.video_id.as_str())
        .bind(&meta.title)
        .bind(meta.views)
        .bind(meta.likes)
        .bind(meta.comments)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(video_id = %meta.video_id, "Upserted video");
        Ok(record)
    }

    /// All videos, most recently created first
    ///
    /// # Errors
    ///
    /// Returns the database error if the query fails.
    pub async fn list(&self) -> Result<Vec<VideoRecord>, sqlx::Error> {
        sqlx::query_as::<_, VideoRecord>(
            "SELECT video_id, title, views, likes, comments, created_at, updated_at
             FROM youtube_videos
             ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Look up one video
    ///
    /// # Errors
    ///
    /// Returns the database error if the query fails.
    pub async fn get(&self, video_id: &str) -> Result<Option<VideoRecord>, sqlx::Error> {
        sqlx::query_as::<_, VideoRecord>(
            "SELECT video_id, title, views, likes, comments, created_at, updated_at
             FROM youtube_videos
             WHERE video_id = ?1",
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a video; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns the database error if the statement fails.
    pub async fn delete(&self, video_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM youtube_videos WHERE video_id = ?1")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
