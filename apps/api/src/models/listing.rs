use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::listings::lifecycle::ListingStatus;

/// One posted job opportunity, joined with its author's verification flag.
///
/// Counters are nullable in storage; readers treat a missing value as zero.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListingRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub city_id: Option<i32>,
    pub sector_id: Option<i32>,
    pub salary: Option<String>,
    pub description: String,
    pub status: String,
    pub views_count: Option<i32>,
    pub likes_count: Option<i32>,
    pub comments_count: Option<i32>,
    pub accepts_platform_applications: bool,
    pub created_at: DateTime<Utc>,
    pub author_verified: Option<bool>,
}

impl JobListingRow {
    pub fn status(&self) -> Option<ListingStatus> {
        ListingStatus::parse(&self.status)
    }

    pub fn is_active(&self) -> bool {
        self.status() == Some(ListingStatus::Active)
    }
}
