//! View-tracking gate: at most one counted view per (listing, viewer, day).
//!
//! Anonymous visits are never counted: without a viewer there is nothing to
//! deduplicate against. The view day is the calendar date at a configured
//! fixed UTC offset (UTC midnight by default).
//!
//! View counts are best-effort telemetry. `track` never returns an error;
//! store failures are logged and reported as `ViewOutcome::Failed`.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engagement::store::EngagementStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOutcome {
    Counted,
    AlreadyCounted,
    Anonymous,
    Failed,
}

#[derive(Clone)]
pub struct ViewGate {
    store: Arc<dyn EngagementStore>,
    day_offset: FixedOffset,
}

impl ViewGate {
    pub fn new(store: Arc<dyn EngagementStore>, day_offset_minutes: i32) -> Self {
        let day_offset = FixedOffset::east_opt(day_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                warn!("View day offset {day_offset_minutes}min out of range; using UTC");
                Utc.fix()
            });
        Self { store, day_offset }
    }

    /// Calendar day a view at `now` belongs to.
    pub fn view_day(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.day_offset).date_naive()
    }

    pub async fn track(
        &self,
        listing_id: Uuid,
        viewer_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ViewOutcome {
        let Some(viewer_id) = viewer_id else {
            return ViewOutcome::Anonymous;
        };
        let day = self.view_day(now);

        match self.store.record_view_once(listing_id, viewer_id, day).await {
            Ok(true) => {
                debug!("Counted view of listing {listing_id} by {viewer_id} on {day}");
                ViewOutcome::Counted
            }
            Ok(false) => ViewOutcome::AlreadyCounted,
            Err(e) => {
                warn!("View tracking failed for listing {listing_id}: {e}");
                ViewOutcome::Failed
            }
        }
    }
}
