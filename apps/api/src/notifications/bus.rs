use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::MultiplexedConnection;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::notifications::Notification;

/// Transport between publishers and hub channels.
#[async_trait]
pub trait NotificationBus: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<()>;

    /// Forwards every notification addressed to `user_id` into `sink` until
    /// the bus closes. The hub aborts this task when the channel is torn down.
    async fn forward(&self, user_id: Uuid, sink: broadcast::Sender<Notification>) -> Result<()>;
}

/// Single-instance bus on a process-wide broadcast channel.
pub struct LocalBus {
    sender: broadcast::Sender<Notification>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

#[async_trait]
impl NotificationBus for LocalBus {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        if self.sender.send(notification.clone()).is_err() {
            debug!("No open notification channels; dropped {}", notification.id);
        }
        Ok(())
    }

    async fn forward(&self, user_id: Uuid, sink: broadcast::Sender<Notification>) -> Result<()> {
        let mut receiver = self.sender.subscribe();
        loop {
            match receiver.recv().await {
                Ok(notification) if notification.recipient_id == user_id => {
                    if sink.send(notification).is_err() {
                        debug!("Notification channel for {user_id} has no receivers");
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Local notification relay for {user_id} skipped {skipped} messages");
                }
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}

/// Multi-instance bus on Redis pub/sub, one channel per recipient.
pub struct RedisBus {
    client: redis::Client,
    publisher: MultiplexedConnection,
}

impl RedisBus {
    pub async fn connect(client: redis::Client) -> Result<Self> {
        let publisher = client.get_multiplexed_async_connection().await?;
        info!("Redis notification bus connected");
        Ok(Self { client, publisher })
    }
}

fn channel_name(user_id: Uuid) -> String {
    format!("notifications:{user_id}")
}

#[async_trait]
impl NotificationBus for RedisBus {
    async fn publish(&self, notification: &Notification) -> Result<()> {
        let payload = serde_json::to_string(notification)?;
        let mut conn = self.publisher.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel_name(notification.recipient_id))
            .arg(payload)
            .query_async(&mut conn)
            .await?;
        debug!("Published notification {} to {receivers} subscriber(s)", notification.id);
        Ok(())
    }

    async fn forward(&self, user_id: Uuid, sink: broadcast::Sender<Notification>) -> Result<()> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel_name(user_id)).await?;
        let mut messages = pubsub.on_message();

        while let Some(message) = messages.next().await {
            let payload: String = match message.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Unreadable notification payload for {user_id}: {e}");
                    continue;
                }
            };
            match serde_json::from_str::<Notification>(&payload) {
                Ok(notification) => {
                    if sink.send(notification).is_err() {
                        debug!("Notification channel for {user_id} has no receivers");
                    }
                }
                Err(e) => warn!("Malformed notification for {user_id}: {e}"),
            }
        }
        Ok(())
    }
}
