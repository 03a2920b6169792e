use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::engagement::store::EngagementStore;
use crate::engagement::views::ViewGate;
use crate::feed::snapshots::FeedSnapshots;
use crate::notifications::hub::NotificationHub;
use crate::onboarding::sessions::OnboardingSessions;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Listings, comments and applications are queried directly on the pool.
    pub db: PgPool,
    pub config: Config,
    /// Atomic like/view primitives. Default: PgEngagementStore.
    pub engagement: Arc<dyn EngagementStore>,
    /// Daily view dedup over `engagement`.
    pub views: ViewGate,
    /// Ranked feed orderings that later pages slice.
    pub feed_snapshots: Arc<FeedSnapshots>,
    pub profiles: Arc<dyn ProfileStore>,
    /// In-progress onboarding wizards, keyed by user.
    pub onboarding: Arc<OnboardingSessions>,
    pub notifications: Arc<NotificationHub>,
}
