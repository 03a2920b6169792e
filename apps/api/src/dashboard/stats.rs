//! Recruiter dashboard aggregation over already-fetched rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::applications::lifecycle::ApplicationStatus;
use crate::feed::scoring::{sort_by_importance, RankingWeights};
use crate::listings::lifecycle::ListingStatus;
use crate::models::application::ApplicationRow;
use crate::models::listing::JobListingRow;

pub const TOP_LISTINGS: usize = 3;

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct ListingCounts {
    pub active: usize,
    pub paused: usize,
    pub closed: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TopListing {
    pub id: Uuid,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardStats {
    pub listings: ListingCounts,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub applications_total: usize,
    pub applications_by_status: BTreeMap<&'static str, usize>,
    /// Applications per counted view; zero when nothing was viewed.
    pub conversion_rate: f64,
    pub top_listings: Vec<TopListing>,
}

fn counter(value: Option<i32>) -> i64 {
    i64::from(value.unwrap_or(0).max(0))
}

pub fn summarize(
    listings: Vec<JobListingRow>,
    applications: &[ApplicationRow],
    now: DateTime<Utc>,
    weights: &RankingWeights,
) -> DashboardStats {
    let mut counts = ListingCounts::default();
    let (mut total_views, mut total_likes, mut total_comments) = (0i64, 0i64, 0i64);
    for listing in &listings {
        match listing.status() {
            Some(ListingStatus::Active) => counts.active += 1,
            Some(ListingStatus::Paused) => counts.paused += 1,
            Some(ListingStatus::Closed) => counts.closed += 1,
            None => {}
        }
        total_views += counter(listing.views_count);
        total_likes += counter(listing.likes_count);
        total_comments += counter(listing.comments_count);
    }

    let mut applications_by_status: BTreeMap<&'static str, usize> = ApplicationStatus::ALL
        .iter()
        .map(|s| (s.as_str(), 0))
        .collect();
    for application in applications {
        if let Some(status) = application.status() {
            *applications_by_status.entry(status.as_str()).or_default() += 1;
        }
    }

    let conversion_rate = if total_views > 0 {
        applications.len() as f64 / total_views as f64
    } else {
        0.0
    };

    let top_listings = sort_by_importance(listings, now, weights)
        .into_iter()
        .filter(|ranked| ranked.listing.is_active())
        .take(TOP_LISTINGS)
        .map(|ranked| TopListing {
            id: ranked.listing.id,
            title: ranked.listing.title,
            score: ranked.score,
        })
        .collect();

    DashboardStats {
        listings: counts,
        total_views,
        total_likes,
        total_comments,
        applications_total: applications.len(),
        applications_by_status,
        conversion_rate,
        top_listings,
    }
}
