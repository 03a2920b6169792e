//! Engagement persistence: atomic counter primitives behind a trait seam.
//!
//! Each operation is a single SQL statement so the existence check and the
//! counter adjustment cannot interleave with a concurrent request.
//! Requires a unique index on `job_views (job_id, viewer_id, view_day)` and
//! on `job_likes (job_id, user_id)`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Like relationship and denormalised counter after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes_count: i32,
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    /// Records a view for `day` and bumps `views_count`, both or neither.
    /// Returns false when this viewer was already counted for that day.
    async fn record_view_once(&self, listing_id: Uuid, viewer_id: Uuid, day: NaiveDate)
        -> Result<bool>;

    /// Flips the like relationship and adjusts `likes_count` accordingly.
    async fn toggle_like(&self, listing_id: Uuid, viewer_id: Uuid) -> Result<LikeState>;

    async fn has_liked(&self, listing_id: Uuid, viewer_id: Uuid) -> Result<bool>;
}

pub struct PgEngagementStore {
    pool: PgPool,
}

impl PgEngagementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EngagementStore for PgEngagementStore {
    async fn record_view_once(
        &self,
        listing_id: Uuid,
        viewer_id: Uuid,
        day: NaiveDate,
    ) -> Result<bool> {
        let bumped: Option<Uuid> = sqlx::query_scalar(
            r#"
            WITH inserted AS (
                INSERT INTO job_views (job_id, viewer_id, view_day)
                VALUES ($1, $2, $3)
                ON CONFLICT (job_id, viewer_id, view_day) DO NOTHING
                RETURNING job_id
            )
            UPDATE jobs
            SET views_count = COALESCE(views_count, 0) + 1
            WHERE id IN (SELECT job_id FROM inserted)
            RETURNING id
            "#,
        )
        .bind(listing_id)
        .bind(viewer_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;
        Ok(bumped.is_some())
    }

    async fn toggle_like(&self, listing_id: Uuid, viewer_id: Uuid) -> Result<LikeState> {
        // When nothing was removed the insert ran; if it hit the unique index
        // a concurrent like won, and the row exists either way.
        let (liked, likes_count): (bool, Option<i32>) = sqlx::query_as(
            r#"
            WITH removed AS (
                DELETE FROM job_likes
                WHERE job_id = $1 AND user_id = $2
                RETURNING job_id
            ),
            inserted AS (
                INSERT INTO job_likes (job_id, user_id)
                SELECT $1, $2
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT (job_id, user_id) DO NOTHING
                RETURNING job_id
            ),
            bumped AS (
                UPDATE jobs
                SET likes_count = GREATEST(
                    COALESCE(likes_count, 0)
                        + (SELECT COUNT(*) FROM inserted)
                        - (SELECT COUNT(*) FROM removed),
                    0)
                WHERE id = $1
                RETURNING likes_count
            )
            SELECT NOT EXISTS (SELECT 1 FROM removed) AS liked,
                   (SELECT likes_count FROM bumped) AS likes_count
            "#,
        )
        .bind(listing_id)
        .bind(viewer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(LikeState {
            liked,
            likes_count: likes_count.unwrap_or(0),
        })
    }

    async fn has_liked(&self, listing_id: Uuid, viewer_id: Uuid) -> Result<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM job_likes WHERE job_id = $1 AND user_id = $2)",
        )
        .bind(listing_id)
        .bind(viewer_id)
        .fetch_one(&self.pool)
        .await?)
    }
}
