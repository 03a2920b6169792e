//! Live onboarding wizards, one per user.
//!
//! The server owns the wizard position: a submitted step is accepted only when
//! it is the user's current step. Nothing is reloaded from the profile, so a
//! user whose wizard was restarted or expired begins again at the first step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::onboarding::wizard::OnboardingWizard;

/// Wizards untouched for this long are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

pub type SharedWizard = Arc<AsyncMutex<OnboardingWizard>>;

struct LiveWizard {
    wizard: SharedWizard,
    touched: Instant,
}

pub struct OnboardingSessions {
    wizards: Mutex<HashMap<Uuid, LiveWizard>>,
    redirect_to: String,
    idle_timeout: Duration,
}

impl OnboardingSessions {
    pub fn new(redirect_to: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            wizards: Mutex::new(HashMap::new()),
            redirect_to: redirect_to.into(),
            idle_timeout,
        }
    }

    /// The user's live wizard, opening one at the first step if there is none.
    pub fn wizard(&self, user_id: Uuid) -> SharedWizard {
        let now = Instant::now();
        let mut wizards = self.lock_wizards();
        self.evict_idle(&mut wizards, now);
        let live = wizards.entry(user_id).or_insert_with(|| {
            debug!("Opening onboarding wizard for {user_id}");
            LiveWizard {
                wizard: Arc::new(AsyncMutex::new(OnboardingWizard::new(
                    user_id,
                    self.redirect_to.clone(),
                ))),
                touched: now,
            }
        });
        live.touched = now;
        Arc::clone(&live.wizard)
    }

    /// Replaces any live wizard with a fresh one at the first step.
    pub fn restart(&self, user_id: Uuid) -> SharedWizard {
        self.lock_wizards().remove(&user_id);
        debug!("Restarting onboarding for {user_id}");
        self.wizard(user_id)
    }

    fn evict_idle(&self, wizards: &mut HashMap<Uuid, LiveWizard>, now: Instant) {
        let before = wizards.len();
        wizards.retain(|_, live| now.duration_since(live.touched) < self.idle_timeout);
        let evicted = before - wizards.len();
        if evicted > 0 {
            debug!("Dropped {evicted} idle onboarding wizard(s)");
        }
    }

    fn lock_wizards(&self) -> MutexGuard<'_, HashMap<Uuid, LiveWizard>> {
        self.wizards.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
