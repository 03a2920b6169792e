use tracing::debug;
use uuid::Uuid;

use crate::engagement::store::{EngagementStore, LikeState};
use crate::errors::AppError;
use crate::models::listing::JobListingRow;

/// New likes and comments are only taken on active listings.
pub fn ensure_accepts_engagement(listing: &JobListingRow) -> Result<(), AppError> {
    if listing.is_active() {
        return Ok(());
    }
    Err(AppError::Conflict(format!(
        "Listing {} is not accepting likes or comments",
        listing.id
    )))
}

/// Flips the viewer's like on a listing. Failures propagate: this is a
/// user-initiated mutation and the caller must revert any optimistic state.
///
/// On a paused or closed listing an existing like can still be withdrawn,
/// but no new one is recorded.
pub async fn toggle_like(
    store: &dyn EngagementStore,
    listing: &JobListingRow,
    viewer_id: Uuid,
) -> Result<LikeState, AppError> {
    let listing_id = listing.id;
    if !listing.is_active() {
        let liked = store
            .has_liked(listing_id, viewer_id)
            .await
            .map_err(AppError::Internal)?;
        if !liked {
            ensure_accepts_engagement(listing)?;
        }
    }

    let state = store
        .toggle_like(listing_id, viewer_id)
        .await
        .map_err(AppError::Internal)?;
    debug!(
        "Listing {listing_id} like by {viewer_id}: liked={} count={}",
        state.liked, state.likes_count
    );
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::store::memory::MemoryEngagementStore;
    use crate::feed::scoring::tests::make_listing;
    use std::sync::atomic::Ordering;

    fn listing_with_status(status: &str) -> JobListingRow {
        JobListingRow {
            status: status.to_string(),
            ..make_listing(1, 0, false)
        }
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let store = MemoryEngagementStore::default();
        let listing = listing_with_status("active");
        let viewer = Uuid::new_v4();

        let first = toggle_like(&store, &listing, viewer).await.unwrap();
        assert_eq!(first, LikeState { liked: true, likes_count: 1 });

        let second = toggle_like(&store, &listing, viewer).await.unwrap();
        assert_eq!(second, LikeState { liked: false, likes_count: 0 });
        assert!(!store.has_liked(listing.id, viewer).await.unwrap());
    }

    #[tokio::test]
    async fn test_likes_from_different_viewers_accumulate() {
        let store = MemoryEngagementStore::default();
        let listing = listing_with_status("active");
        toggle_like(&store, &listing, Uuid::new_v4()).await.unwrap();
        let state = toggle_like(&store, &listing, Uuid::new_v4()).await.unwrap();
        assert_eq!(state.likes_count, 2);
        assert_eq!(store.likes_count(listing.id), 2);
    }

    #[tokio::test]
    async fn test_toggle_failure_propagates() {
        let store = MemoryEngagementStore::default();
        store.fail.store(true, Ordering::SeqCst);
        let result = toggle_like(&store, &listing_with_status("active"), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_inactive_listing_refuses_new_like() {
        let store = MemoryEngagementStore::default();
        for status in ["paused", "closed"] {
            let listing = listing_with_status(status);
            let result = toggle_like(&store, &listing, Uuid::new_v4()).await;
            assert!(matches!(result, Err(AppError::Conflict(_))), "{status}");
            assert_eq!(store.likes_count(listing.id), 0);
        }
    }

    #[tokio::test]
    async fn test_like_can_be_withdrawn_after_pause() {
        let store = MemoryEngagementStore::default();
        let viewer = Uuid::new_v4();
        let active = listing_with_status("active");
        toggle_like(&store, &active, viewer).await.unwrap();

        let paused = JobListingRow {
            status: "paused".to_string(),
            ..active
        };
        let state = toggle_like(&store, &paused, viewer).await.unwrap();
        assert_eq!(state, LikeState { liked: false, likes_count: 0 });

        let again = toggle_like(&store, &paused, viewer).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_comments_and_likes_share_activity_rule() {
        assert!(ensure_accepts_engagement(&listing_with_status("active")).is_ok());
        assert!(ensure_accepts_engagement(&listing_with_status("closed")).is_err());
    }
}
