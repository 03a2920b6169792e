//! Client-side driver of the infinite scroll.
//!
//! The HTTP feed answers one page per request over a ranked snapshot; a
//! client runs this loop around it, waiting out the fixed reveal delay before
//! asking for the next page.

#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::Mutex;

use crate::feed::reveal::RevealController;

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(500);

/// Async driver around the controller with the artificial reveal delay.
///
/// Concurrent sentinel signals are safe: while one reveal sleeps, every
/// other signal is a no-op.
pub struct FeedSession {
    controller: Mutex<RevealController>,
    delay: Duration,
}

impl FeedSession {
    pub fn new(total: usize, page_size: usize, delay: Duration) -> Self {
        Self {
            controller: Mutex::new(RevealController::new(total, page_size)),
            delay,
        }
    }

    /// Returns true when this signal revealed more items.
    pub async fn sentinel_reached(&self) -> bool {
        let pending = self.controller.lock().await.on_sentinel();
        let Some(pending) = pending else {
            return false;
        };
        tokio::time::sleep(self.delay).await;
        self.controller.lock().await.complete(pending)
    }

    pub async fn listing_set_changed(&self, total: usize) {
        self.controller.lock().await.reset(total);
    }

    pub async fn snapshot(&self) -> RevealController {
        self.controller.lock().await.clone()
    }
}
