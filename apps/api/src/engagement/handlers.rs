use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::engagement::comments::{create_comment, list_comments, normalize_comment_body};
use crate::engagement::likes::{ensure_accepts_engagement, toggle_like};
use crate::engagement::store::LikeState;
use crate::errors::AppError;
use crate::listings::queries::get_listing;
use crate::models::engagement::CommentRow;
use crate::models::listing::JobListingRow;
use crate::notifications::{Notification, NotificationKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LikeRequest {
    pub viewer_id: Uuid,
}

#[derive(Deserialize)]
pub struct LikeQuery {
    pub viewer_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub author_id: Uuid,
    pub body: String,
}

async fn require_listing(state: &AppState, listing_id: Uuid) -> Result<JobListingRow, AppError> {
    get_listing(&state.db, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))
}

/// Tells the listing author about someone else's interaction.
async fn notify_author(
    state: &AppState,
    listing: &JobListingRow,
    actor_id: Uuid,
    kind: NotificationKind,
) {
    if listing.author_id == actor_id {
        return;
    }
    state
        .notifications
        .notify(Notification::new(listing.author_id, kind, listing.id, actor_id))
        .await;
}

/// POST /api/v1/listings/:id/like
///
/// Toggles the viewer's like. Paused and closed listings only allow taking a
/// like back. Returns the relationship and counter after the
/// toggle so the client can reconcile its optimistic state.
pub async fn handle_toggle_like(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<LikeRequest>,
) -> Result<Json<LikeState>, AppError> {
    let listing = require_listing(&state, listing_id).await?;
    let like = toggle_like(state.engagement.as_ref(), &listing, req.viewer_id).await?;
    if like.liked {
        notify_author(&state, &listing, req.viewer_id, NotificationKind::ListingLiked).await;
    }
    Ok(Json(like))
}

/// GET /api/v1/listings/:id/like
pub async fn handle_like_state(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Query(params): Query<LikeQuery>,
) -> Result<Json<LikeState>, AppError> {
    let listing = require_listing(&state, listing_id).await?;
    let liked = match params.viewer_id {
        Some(viewer_id) => state
            .engagement
            .has_liked(listing_id, viewer_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read like state for listing {listing_id}: {e}");
                false
            }),
        None => false,
    };
    Ok(Json(LikeState {
        liked,
        likes_count: listing.likes_count.unwrap_or(0).max(0),
    }))
}

/// POST /api/v1/listings/:id/comments
pub async fn handle_create_comment(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentRow>), AppError> {
    let body = normalize_comment_body(&req.body)?;
    let listing = require_listing(&state, listing_id).await?;
    ensure_accepts_engagement(&listing)?;

    let comment = create_comment(&state.db, listing_id, req.author_id, &body)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Listing {listing_id} is not accepting comments"))
        })?;

    notify_author(&state, &listing, req.author_id, NotificationKind::ListingCommented).await;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/v1/listings/:id/comments
pub async fn handle_list_comments(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Json<Vec<CommentRow>> {
    Json(list_comments(&state.db, listing_id).await)
}
