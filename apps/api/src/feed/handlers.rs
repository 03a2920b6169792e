use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::feed::filters::{FeedFilter, SalaryRange};
use crate::feed::reveal::reveal_window;
use crate::feed::scoring::{sort_by_importance, RankedListing};
use crate::feed::snapshots::FeedSnapshot;
use crate::listings::queries::fetch_active_listings;
use crate::state::AppState;

/// Query string for `GET /api/v1/feed`.
///
/// `sectors` and `salary` are comma-separated lists. `snapshot` is the token
/// returned with the first page; later pages pass it back to slice the same
/// ordering.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub city_id: Option<i32>,
    pub q: Option<String>,
    pub sectors: Option<String>,
    pub salary: Option<String>,
    pub page: Option<usize>,
    pub snapshot: Option<Uuid>,
}

impl FeedQuery {
    pub fn to_filter(&self) -> Result<FeedFilter, AppError> {
        let sector_ids = split_list(self.sectors.as_deref())
            .map(|s| {
                s.parse::<i32>()
                    .map_err(|_| AppError::Validation(format!("invalid sector id '{s}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let salary_ranges = split_list(self.salary.as_deref())
            .map(|s| {
                s.parse::<SalaryRange>()
                    .map_err(|e| AppError::Validation(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeedFilter {
            city_id: self.city_id,
            search: self.q.clone(),
            sector_ids,
            salary_ranges,
        })
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub listings: Vec<RankedListing>,
    pub page: usize,
    pub revealed: usize,
    pub total: usize,
    pub has_more: bool,
    pub as_of: DateTime<Utc>,
    pub snapshot: Uuid,
}

/// Page `page` of a stored ranking.
pub fn feed_page(snapshot: &FeedSnapshot, page: usize, page_size: usize) -> FeedResponse {
    let (window, visible) = reveal_window(&snapshot.ranked, page, page_size);
    FeedResponse {
        listings: visible.to_vec(),
        page: window.page,
        revealed: window.revealed,
        total: window.total,
        has_more: window.has_more,
        as_of: snapshot.as_of,
        snapshot: snapshot.token,
    }
}

async fn rank_feed(state: &AppState, filter: &FeedFilter, now: DateTime<Utc>) -> Vec<RankedListing> {
    let candidates = fetch_active_listings(&state.db, filter.city_id).await;
    let matching: Vec<_> = candidates
        .into_iter()
        .filter(|listing| filter.matches(listing))
        .collect();
    sort_by_importance(matching, now, &state.config.ranking)
}

/// GET /api/v1/feed
///
/// Returns the revealed prefix of the ranked, filtered active listings.
/// Without a token, or with one that expired or was ranked for another
/// filter, the listings are ranked afresh under a new token; an unknown token
/// also restarts at page 1. A backend read failure yields an empty feed
/// rather than an error.
pub async fn handle_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let filter = params.to_filter()?;
    let now = Utc::now();
    let mut page = params.page.unwrap_or(1);

    let held = params
        .snapshot
        .and_then(|token| state.feed_snapshots.get(token, &filter, now));
    let snapshot = match held {
        Some(snapshot) => snapshot,
        None => {
            if params.snapshot.is_some() {
                page = 1;
            }
            let ranked = rank_feed(&state, &filter, now).await;
            state.feed_snapshots.insert(filter, now, ranked)
        }
    };

    let response = feed_page(&snapshot, page, state.config.feed_page_size);
    tracing::debug!(
        "Feed page {} revealed {}/{} listings from snapshot {}",
        response.page,
        response.revealed,
        response.total,
        response.snapshot
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::scoring::tests::{fixed_now, make_listing};
    use crate::feed::scoring::RankingWeights;
    use crate::feed::snapshots::FeedSnapshots;

    fn ids(listings: &[RankedListing]) -> Vec<Uuid> {
        listings.iter().map(|r| r.listing.id).collect()
    }

    #[test]
    fn test_later_page_keeps_shown_prefix_when_counters_move() {
        let weights = RankingWeights::default();
        let snapshots = FeedSnapshots::default();
        let mut rows: Vec<_> = (1..=12).map(|age| make_listing(age, 0, false)).collect();

        let ranked = sort_by_importance(rows.clone(), fixed_now(), &weights);
        let first = feed_page(
            &snapshots.insert(FeedFilter::default(), fixed_now(), ranked),
            1,
            5,
        );
        assert_eq!(first.revealed, 5);

        // The oldest listing gets liked between page requests.
        rows[11].likes_count = Some(100);
        let reranked = sort_by_importance(rows.clone(), fixed_now(), &weights);
        assert_eq!(reranked[0].listing.id, rows[11].id);
        assert_ne!(ids(&reranked[..5]), ids(&first.listings));

        let held = snapshots
            .get(first.snapshot, &FeedFilter::default(), fixed_now())
            .unwrap();
        let second = feed_page(&held, 2, 5);
        assert_eq!(second.snapshot, first.snapshot);
        assert_eq!(second.revealed, 10);
        assert_eq!(ids(&second.listings[..5]), ids(&first.listings));
        assert!(!ids(&second.listings).contains(&rows[11].id));

        let third = feed_page(&held, 3, 5);
        assert_eq!(third.revealed, 12);
        assert!(!third.has_more);
        assert_eq!(ids(&third.listings[..10]), ids(&second.listings));
    }

    #[test]
    fn test_page_zero_reads_as_first_page() {
        let snapshots = FeedSnapshots::default();
        let rows = (1..=7).map(|age| make_listing(age, 0, false)).collect();
        let ranked = sort_by_importance(rows, fixed_now(), &RankingWeights::default());
        let snapshot = snapshots.insert(FeedFilter::default(), fixed_now(), ranked);

        let page = feed_page(&snapshot, 0, 5);
        assert_eq!(page.page, 1);
        assert_eq!(page.listings.len(), 5);
        assert!(page.has_more);
        assert_eq!(page.as_of, fixed_now());
    }

    #[test]
    fn test_query_to_filter_parses_lists() {
        let query = FeedQuery {
            sectors: Some("1, 4,,9".to_string()),
            salary: Some("1000-2000,5000+".to_string()),
            ..FeedQuery::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.sector_ids, vec![1, 4, 9]);
        assert_eq!(filter.salary_ranges.len(), 2);
    }

    #[test]
    fn test_query_to_filter_rejects_bad_sector() {
        let query = FeedQuery {
            sectors: Some("abc".to_string()),
            ..FeedQuery::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_query_to_filter_rejects_bad_salary() {
        let query = FeedQuery {
            salary: Some("lots".to_string()),
            ..FeedQuery::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::Validation(_))));
    }
}
