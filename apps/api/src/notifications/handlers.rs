use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct StreamQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/notifications/stream
///
/// Server-Sent Events for one recipient. The subscription lives inside the
/// stream, so a disconnected client releases its channel slot.
pub async fn handle_notification_stream(
    State(state): State<AppState>,
    Query(params): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.notifications.acquire(params.user_id);
    info!(
        "Notification stream opened for {} ({} stream(s) for this user, {} channel(s) open)",
        params.user_id,
        state.notifications.consumer_count(params.user_id),
        state.notifications.open_channels()
    );

    let events = stream::unfold(subscription, |mut subscription| async move {
        let notification = subscription.recv().await?;
        let event = Event::default()
            .event("notification")
            .json_data(&notification)
            .unwrap_or_else(|e| {
                warn!("Failed to encode notification {}: {e}", notification.id);
                Event::default().comment("undeliverable notification")
            });
        Some((Ok::<_, Infallible>(event), subscription))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
