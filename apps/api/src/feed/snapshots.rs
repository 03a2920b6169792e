//! Ranked feed orderings held between page requests.
//!
//! The first page of a feed ranks the filtered listings once and stores the
//! result under a token. Later pages that present the token slice that same
//! ordering, so likes or views landing between requests cannot reorder a
//! prefix the viewer has already seen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::feed::filters::FeedFilter;
use crate::feed::scoring::RankedListing;

pub const SNAPSHOT_TTL_MINUTES: i64 = 30;
pub const MAX_SNAPSHOTS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub token: Uuid,
    pub filter: FeedFilter,
    pub as_of: DateTime<Utc>,
    pub ranked: Arc<[RankedListing]>,
}

pub struct FeedSnapshots {
    entries: Mutex<HashMap<Uuid, FeedSnapshot>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for FeedSnapshots {
    fn default() -> Self {
        Self::new(Duration::minutes(SNAPSHOT_TTL_MINUTES), MAX_SNAPSHOTS)
    }
}

impl FeedSnapshots {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Stores a fresh ranking under a new token.
    pub fn insert(
        &self,
        filter: FeedFilter,
        as_of: DateTime<Utc>,
        ranked: Vec<RankedListing>,
    ) -> FeedSnapshot {
        let snapshot = FeedSnapshot {
            token: Uuid::new_v4(),
            filter,
            as_of,
            ranked: ranked.into(),
        };

        let mut entries = self.lock_entries();
        entries.retain(|_, s| !self.is_expired(s, as_of));
        while entries.len() >= self.capacity {
            let Some(oldest) = entries.values().min_by_key(|s| s.as_of).map(|s| s.token) else {
                break;
            };
            entries.remove(&oldest);
        }
        entries.insert(snapshot.token, snapshot.clone());
        debug!(
            "Stored feed snapshot {} ({} listings, {} held)",
            snapshot.token,
            snapshot.ranked.len(),
            entries.len()
        );
        snapshot
    }

    /// The snapshot behind `token`, if it is still fresh and was ranked for
    /// the same filter.
    pub fn get(&self, token: Uuid, filter: &FeedFilter, now: DateTime<Utc>) -> Option<FeedSnapshot> {
        let mut entries = self.lock_entries();
        let snapshot = entries.get(&token)?;
        if self.is_expired(snapshot, now) {
            entries.remove(&token);
            return None;
        }
        (snapshot.filter == *filter).then(|| snapshot.clone())
    }

    fn is_expired(&self, snapshot: &FeedSnapshot, now: DateTime<Utc>) -> bool {
        now - snapshot.as_of >= self.ttl
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<Uuid, FeedSnapshot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
