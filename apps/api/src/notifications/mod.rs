//! Real-time notifications for listing authors and candidates.
//!
//! `NotificationHub` owns one broadcast channel per recipient, shared by every
//! open stream of that recipient and kept alive by a consumer count. The
//! `NotificationBus` behind it carries notifications between publishers and
//! hubs: in-process for a single instance, Redis pub/sub across instances.

pub mod bus;
pub mod handlers;
pub mod hub;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ListingLiked,
    ListingCommented,
    ApplicationReceived,
    ApplicationStatusChanged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub listing_id: Uuid,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: Uuid,
        kind: NotificationKind,
        listing_id: Uuid,
        actor_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            listing_id,
            actor_id,
            created_at: Utc::now(),
        }
    }
}
