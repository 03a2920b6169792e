use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::listings::lifecycle::ListingStatus;
use crate::listings::queries::{
    create_listing, get_listing, listings_by_author, update_status, NewListing,
};
use crate::models::listing::JobListingRow;
use crate::models::profile::UserType;
use crate::profile::validation::{optional_text, FieldError, FieldErrors};
use crate::state::AppState;

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub author_id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    pub city_id: Option<i32>,
    pub sector_id: Option<i32>,
    pub salary: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub accepts_platform_applications: bool,
}

/// Trimmed, validated fields of a listing about to be created.
#[derive(Debug, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: String,
}

impl CreateListingRequest {
    pub fn validate(&self) -> Result<ListingDraft, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let title = errors.required_max("title", &self.title, MAX_TITLE_CHARS);
        let company = errors.required("company", &self.company);
        let location = errors.required("location", &self.location);
        let description =
            errors.required_max("description", &self.description, MAX_DESCRIPTION_CHARS);
        errors.finish(ListingDraft {
            title,
            company,
            location,
            salary: optional_text(self.salary.as_deref()),
            description,
        })
    }
}

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub viewer_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct AuthorQuery {
    pub author_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: JobListingRow,
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub user_id: Uuid,
    pub status: ListingStatus,
}

/// POST /api/v1/listings
pub async fn handle_create_listing(
    State(state): State<AppState>,
    Json(req): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<JobListingRow>), AppError> {
    let draft = req.validate().map_err(|errors| AppError::FieldValidation {
        scope: "listing".to_string(),
        errors,
    })?;

    let author = state
        .profiles
        .fetch_profile(req.author_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", req.author_id)))?;
    if author.user_type() != Some(UserType::Recruiter) {
        return Err(AppError::Forbidden(
            "Only recruiters can post listings".to_string(),
        ));
    }

    let row = create_listing(
        &state.db,
        NewListing {
            author_id: req.author_id,
            title: &draft.title,
            company: &draft.company,
            location: &draft.location,
            city_id: req.city_id,
            sector_id: req.sector_id,
            salary: draft.salary.as_deref(),
            description: &draft.description,
            accepts_platform_applications: req.accepts_platform_applications,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/listings/:id
///
/// Counts the view in the background; the response never waits on it.
pub async fn handle_get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<ListingDetail>, AppError> {
    let listing = get_listing(&state.db, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;

    let views = state.views.clone();
    let viewer_id = params.viewer_id;
    tokio::spawn(async move {
        views.track(listing_id, viewer_id, Utc::now()).await;
    });

    let liked = match viewer_id {
        Some(viewer_id) => state
            .engagement
            .has_liked(listing_id, viewer_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to read like state for listing {listing_id}: {e}");
                false
            }),
        None => false,
    };

    Ok(Json(ListingDetail { listing, liked }))
}

/// GET /api/v1/listings?author_id=
pub async fn handle_listings_by_author(
    State(state): State<AppState>,
    Query(params): Query<AuthorQuery>,
) -> Json<Vec<JobListingRow>> {
    Json(listings_by_author(&state.db, params.author_id).await)
}

/// PATCH /api/v1/listings/:id/status
pub async fn handle_change_status(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<JobListingRow>, AppError> {
    let listing = get_listing(&state.db, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;
    if listing.author_id != req.user_id {
        return Err(AppError::Forbidden(
            "Only the author can change a listing's status".to_string(),
        ));
    }

    let current = listing.status().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Listing {listing_id} has unknown status '{}'",
            listing.status
        ))
    })?;
    let next = current
        .transition_to(req.status)
        .map_err(|e| AppError::InvalidTransition(e.to_string()))?;

    if !update_status(&state.db, listing_id, current, next).await? {
        return Err(AppError::Conflict(
            "Listing status changed concurrently; reload and retry".to_string(),
        ));
    }
    info!("Listing {listing_id} is now {}", next.as_str());

    Ok(Json(JobListingRow {
        status: next.as_str().to_string(),
        ..listing
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateListingRequest {
        CreateListingRequest {
            author_id: Uuid::new_v4(),
            title: " Auxiliar de Cozinha ".to_string(),
            company: "Restaurante Sabor".to_string(),
            location: "Centro, Curitiba".to_string(),
            city_id: Some(4106902),
            sector_id: Some(3),
            salary: Some("  ".to_string()),
            description: "Preparo de alimentos e organização da cozinha.".to_string(),
            accepts_platform_applications: true,
        }
    }

    #[test]
    fn test_validate_trims_and_drops_blank_salary() {
        let draft = request().validate().unwrap();
        assert_eq!(draft.title, "Auxiliar de Cozinha");
        assert_eq!(draft.salary, None);
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let req = CreateListingRequest {
            title: String::new(),
            company: " ".to_string(),
            ..request()
        };
        let fields: Vec<String> = req
            .validate()
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["title", "company"]);
    }

    #[test]
    fn test_platform_applications_default_on() {
        let req: CreateListingRequest = serde_json::from_value(serde_json::json!({
            "author_id": Uuid::new_v4(),
            "title": "Vendedor",
        }))
        .unwrap();
        assert!(req.accepts_platform_applications);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_request_parses_snake_case() {
        let req: StatusChangeRequest = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "status": "paused",
        }))
        .unwrap();
        assert_eq!(req.status, ListingStatus::Paused);
    }
}
