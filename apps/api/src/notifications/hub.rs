use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::notifications::bus::NotificationBus;
use crate::notifications::Notification;

struct SharedChannel {
    sender: broadcast::Sender<Notification>,
    consumers: usize,
    relay: JoinHandle<()>,
}

/// Reference-counted per-recipient channels.
///
/// The first `acquire` for a user opens the channel and spawns its relay from
/// the bus; dropping the last `NotificationSubscription` closes both.
pub struct NotificationHub {
    bus: Arc<dyn NotificationBus>,
    channels: Mutex<HashMap<Uuid, SharedChannel>>,
    capacity: usize,
}

impl NotificationHub {
    pub fn new(bus: Arc<dyn NotificationBus>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            bus,
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        })
    }

    /// Opens (or joins) the channel for `user_id`. Must run inside a Tokio
    /// runtime: opening a channel spawns its relay task.
    pub fn acquire(self: &Arc<Self>, user_id: Uuid) -> NotificationSubscription {
        let mut channels = self.lock_channels();
        let channel = channels
            .entry(user_id)
            .or_insert_with(|| self.open_channel(user_id));
        channel.consumers += 1;
        let receiver = channel.sender.subscribe();
        debug!(
            "Notification channel for {user_id} now has {} consumer(s)",
            channel.consumers
        );

        NotificationSubscription {
            hub: Arc::clone(self),
            user_id,
            receiver,
        }
    }

    /// Best-effort delivery: failures are logged, never surfaced.
    pub async fn notify(&self, notification: Notification) {
        if let Err(e) = self.bus.publish(&notification).await {
            warn!(
                "Failed to publish {:?} notification to {}: {e}",
                notification.kind, notification.recipient_id
            );
        }
    }

    pub fn consumer_count(&self, user_id: Uuid) -> usize {
        self.lock_channels()
            .get(&user_id)
            .map_or(0, |channel| channel.consumers)
    }

    pub fn open_channels(&self) -> usize {
        self.lock_channels().len()
    }

    fn open_channel(&self, user_id: Uuid) -> SharedChannel {
        let (sender, _) = broadcast::channel(self.capacity);
        let bus = Arc::clone(&self.bus);
        let sink = sender.clone();
        let relay = tokio::spawn(async move {
            if let Err(e) = bus.forward(user_id, sink).await {
                warn!("Notification relay for {user_id} stopped: {e}");
            }
        });
        debug!("Opened notification channel for {user_id}");
        SharedChannel {
            sender,
            consumers: 0,
            relay,
        }
    }

    fn release(&self, user_id: Uuid) {
        let mut channels = self.lock_channels();
        let Some(channel) = channels.get_mut(&user_id) else {
            return;
        };
        channel.consumers = channel.consumers.saturating_sub(1);
        if channel.consumers == 0 {
            if let Some(channel) = channels.remove(&user_id) {
                channel.relay.abort();
                debug!("Closed notification channel for {user_id}");
            }
        }
    }

    fn lock_channels(&self) -> MutexGuard<'_, HashMap<Uuid, SharedChannel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped handle on a recipient's channel; releases its slot on drop.
pub struct NotificationSubscription {
    hub: Arc<NotificationHub>,
    user_id: Uuid,
    receiver: broadcast::Receiver<Notification>,
}

impl NotificationSubscription {
    /// Next notification, or None once the channel closes. Lagged messages
    /// are skipped with a warning.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => return Some(notification),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Subscriber of {} skipped {skipped} notifications", self.user_id);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        self.hub.release(self.user_id);
    }
}
