//! Feed ranking: importance score and total-order sort for active listings.
//!
//! score = recency·w_r + engagement·w_e + verified_bonus
//!
//! - recency halves every `recency_half_life_days`, 1.0 for a listing posted now
//! - engagement saturates towards 1.0: raw / (raw + saturation)
//! - the verified bonus is flat, added only when the author is verified
//!
//! Every term is monotonic in its signal, so more likes, more views, a more
//! recent post or a verified author never lower a listing's score.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::listing::JobListingRow;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub recency: f64,
    pub engagement: f64,
    pub verified_bonus: f64,
    pub recency_half_life_days: f64,
    pub like_weight: f64,
    pub view_weight: f64,
    pub comment_weight: f64,
    pub engagement_saturation: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            recency: 0.5,
            engagement: 0.35,
            verified_bonus: 0.15,
            recency_half_life_days: 7.0,
            like_weight: 3.0,
            view_weight: 1.0,
            comment_weight: 2.0,
            engagement_saturation: 30.0,
        }
    }
}

/// A listing paired with the score it was ranked by.
#[derive(Debug, Clone, Serialize)]
pub struct RankedListing {
    #[serde(flatten)]
    pub listing: JobListingRow,
    pub score: f64,
}

/// Importance score for one listing as of `now`.
pub fn score_listing(listing: &JobListingRow, now: DateTime<Utc>, weights: &RankingWeights) -> f64 {
    let recency = recency_factor(listing.created_at, now, weights.recency_half_life_days);
    let engagement = engagement_factor(listing, weights);
    let bonus = if listing.author_verified.unwrap_or(false) {
        weights.verified_bonus
    } else {
        0.0
    };
    weights.recency * recency + weights.engagement * engagement + bonus
}

/// Ranks listings by descending score.
///
/// Ties resolve by newer `created_at` first, then by ascending id, so the
/// order is total and identical input always produces identical output.
pub fn sort_by_importance(
    listings: Vec<JobListingRow>,
    now: DateTime<Utc>,
    weights: &RankingWeights,
) -> Vec<RankedListing> {
    let mut ranked: Vec<RankedListing> = listings
        .into_iter()
        .map(|listing| {
            let score = score_listing(&listing, now, weights);
            RankedListing { listing, score }
        })
        .collect();
    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &RankedListing, b: &RankedListing) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.listing.created_at.cmp(&a.listing.created_at))
        .then_with(|| a.listing.id.cmp(&b.listing.id))
}

/// Exponential decay by age. Listings dated in the future count as brand new.
fn recency_factor(created_at: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let age_days = (now - created_at).num_seconds().max(0) as f64 / SECONDS_PER_DAY;
    0.5_f64.powf(age_days / half_life_days).clamp(0.0, 1.0)
}

fn engagement_factor(listing: &JobListingRow, weights: &RankingWeights) -> f64 {
    let raw = counter(listing.likes_count) * weights.like_weight
        + counter(listing.views_count) * weights.view_weight
        + counter(listing.comments_count) * weights.comment_weight;
    if raw <= 0.0 {
        return 0.0;
    }
    if weights.engagement_saturation <= 0.0 {
        return 1.0;
    }
    raw / (raw + weights.engagement_saturation)
}

/// Null and negative counters both read as zero.
fn counter(value: Option<i32>) -> f64 {
    f64::from(value.unwrap_or(0).max(0))
}
