use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::queries::applications_for_author;
use crate::dashboard::stats::{summarize, DashboardStats};
use crate::errors::AppError;
use crate::listings::queries::listings_by_author;
use crate::models::profile::UserType;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/dashboard?user_id=
pub async fn handle_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    let profile = state
        .profiles
        .fetch_profile(params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", params.user_id)))?;
    if profile.user_type() != Some(UserType::Recruiter) {
        return Err(AppError::Forbidden(
            "The dashboard is only available to recruiters".to_string(),
        ));
    }

    let (listings, applications) = tokio::join!(
        listings_by_author(&state.db, params.user_id),
        applications_for_author(&state.db, params.user_id),
    );
    Ok(Json(summarize(
        listings,
        &applications,
        Utc::now(),
        &state.config.ranking,
    )))
}
