use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::lifecycle::{
    check_can_apply, ApplicationStatus, ApplicationType, ApplyError,
};
use crate::applications::queries::{
    applications_for_candidate, applications_for_listing, create_application, get_application,
    update_application_status, update_notes,
};
use crate::errors::AppError;
use crate::listings::queries::get_listing;
use crate::models::application::ApplicationRow;
use crate::models::listing::JobListingRow;
use crate::models::profile::UserType;
use crate::notifications::{Notification, NotificationKind};
use crate::profile::validation::optional_text;
use crate::state::AppState;

pub const MAX_NOTES_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub candidate_id: Uuid,
    pub application_type: ApplicationType,
    pub resume_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CandidateQuery {
    pub candidate_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationStatusRequest {
    pub user_id: Uuid,
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub user_id: Uuid,
    pub notes: Option<String>,
}

impl From<ApplyError> for AppError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::OwnListing => AppError::Forbidden(err.to_string()),
            ApplyError::ListingNotActive | ApplyError::PlatformDisabled => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

async fn listing_owned_by(
    state: &AppState,
    listing_id: Uuid,
    user_id: Uuid,
) -> Result<JobListingRow, AppError> {
    let listing = get_listing(&state.db, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;
    if listing.author_id != user_id {
        return Err(AppError::Forbidden(
            "Only the listing author can manage its applications".to_string(),
        ));
    }
    Ok(listing)
}

async fn application_managed_by(
    state: &AppState,
    application_id: Uuid,
    user_id: Uuid,
) -> Result<ApplicationRow, AppError> {
    let application = get_application(&state.db, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    listing_owned_by(state, application.job_id, user_id).await?;
    Ok(application)
}

/// POST /api/v1/listings/:id/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let listing = get_listing(&state.db, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;
    check_can_apply(&listing, req.candidate_id, req.application_type)?;

    let candidate = state
        .profiles
        .fetch_profile(req.candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", req.candidate_id)))?;
    if candidate.user_type() != Some(UserType::Candidate) {
        return Err(AppError::Forbidden("Only candidates can apply".to_string()));
    }

    let resume_ref = optional_text(req.resume_ref.as_deref());
    let application = create_application(
        &state.db,
        listing_id,
        req.candidate_id,
        req.application_type,
        resume_ref.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::Conflict("You already applied to this listing".to_string()))?;

    state
        .notifications
        .notify(Notification::new(
            listing.author_id,
            NotificationKind::ApplicationReceived,
            listing_id,
            req.candidate_id,
        ))
        .await;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/listings/:id/applications?user_id=
pub async fn handle_listing_applications(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    listing_owned_by(&state, listing_id, params.user_id).await?;
    Ok(Json(applications_for_listing(&state.db, listing_id).await))
}

/// GET /api/v1/applications?candidate_id=
pub async fn handle_candidate_applications(
    State(state): State<AppState>,
    Query(params): Query<CandidateQuery>,
) -> Json<Vec<ApplicationRow>> {
    Json(applications_for_candidate(&state.db, params.candidate_id).await)
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_application_status(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(req): Json<ApplicationStatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = application_managed_by(&state, application_id, req.user_id).await?;
    let current = application.status().ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Application {application_id} has unknown status '{}'",
            application.status
        ))
    })?;
    let next = current
        .transition_to(req.status)
        .map_err(|e| AppError::InvalidTransition(e.to_string()))?;

    let updated = update_application_status(&state.db, application_id, current, next)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(
                "Application status changed concurrently; reload and retry".to_string(),
            )
        })?;

    state
        .notifications
        .notify(Notification::new(
            updated.candidate_id,
            NotificationKind::ApplicationStatusChanged,
            updated.job_id,
            req.user_id,
        ))
        .await;

    Ok(Json(updated))
}

/// PATCH /api/v1/applications/:id/notes
///
/// Private recruiter notes; independent of the status machine.
pub async fn handle_application_notes(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let notes = optional_text(req.notes.as_deref());
    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_CHARS)
    {
        return Err(AppError::Validation(format!(
            "notes exceed {MAX_NOTES_CHARS} characters"
        )));
    }

    application_managed_by(&state, application_id, req.user_id).await?;
    let updated = update_notes(&state.db, application_id, notes.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    Ok(Json(updated))
}
