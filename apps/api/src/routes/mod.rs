pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::dashboard::handlers as dashboard;
use crate::engagement::handlers as engagement;
use crate::feed::handlers as feed;
use crate::listings::handlers as listings;
use crate::notifications::handlers as notifications;
use crate::onboarding::handlers as onboarding;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Feed
        .route("/api/v1/feed", get(feed::handle_feed))
        // Listings
        .route(
            "/api/v1/listings",
            get(listings::handle_listings_by_author).post(listings::handle_create_listing),
        )
        .route("/api/v1/listings/:id", get(listings::handle_get_listing))
        .route(
            "/api/v1/listings/:id/status",
            patch(listings::handle_change_status),
        )
        // Engagement
        .route(
            "/api/v1/listings/:id/like",
            get(engagement::handle_like_state).post(engagement::handle_toggle_like),
        )
        .route(
            "/api/v1/listings/:id/comments",
            get(engagement::handle_list_comments).post(engagement::handle_create_comment),
        )
        // Applications
        .route(
            "/api/v1/listings/:id/applications",
            get(applications::handle_listing_applications).post(applications::handle_apply),
        )
        .route(
            "/api/v1/applications",
            get(applications::handle_candidate_applications),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_application_status),
        )
        .route(
            "/api/v1/applications/:id/notes",
            patch(applications::handle_application_notes),
        )
        // Onboarding and profiles
        .route("/api/v1/onboarding", get(onboarding::handle_wizard_position))
        .route(
            "/api/v1/onboarding/steps",
            post(onboarding::handle_submit_step),
        )
        .route("/api/v1/onboarding/back", post(onboarding::handle_step_back))
        .route("/api/v1/onboarding/restart", post(onboarding::handle_restart))
        .route("/api/v1/profiles/:id", get(profile::handle_get_profile))
        .route(
            "/api/v1/profiles/:id/:collection",
            post(profile::handle_add_entry),
        )
        .route(
            "/api/v1/profiles/:id/:collection/:entry_id",
            put(profile::handle_update_entry).delete(profile::handle_remove_entry),
        )
        // Dashboard and notifications
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        .route(
            "/api/v1/notifications/stream",
            get(notifications::handle_notification_stream),
        )
        .with_state(state)
}
