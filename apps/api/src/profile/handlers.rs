use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::profile::collections::{EntryCollection, EntryList, ProfileEntry};
use crate::profile::entries::{
    Address, CourseDraft, CourseEntry, EducationDraft, EducationEntry, ExperienceDraft,
    ExperienceEntry,
};
use crate::state::AppState;

/// Public shape of a profile: JSONB columns decoded into typed entry lists.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub user_type: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city_id: Option<i32>,
    pub location: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub is_verified: bool,
    pub has_experience: Option<bool>,
    pub experiences: EntryList<ExperienceEntry>,
    pub education: EntryList<EducationEntry>,
    pub courses: EntryList<CourseEntry>,
    pub skills: Vec<String>,
    pub driver_license_categories: Vec<String>,
    pub summary: Option<String>,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRow> for ProfileView {
    fn from(row: ProfileRow) -> Self {
        let address = row
            .address
            .as_ref()
            .filter(|v| !v.is_null())
            .and_then(|v| match serde_json::from_value::<Address>(v.clone()) {
                Ok(address) => Some(address),
                Err(e) => {
                    warn!("Ignoring malformed address on profile {}: {e}", row.id);
                    None
                }
            });

        ProfileView {
            experiences: EntryList::from_json(row.experiences.as_ref()),
            education: EntryList::from_json(row.education.as_ref()),
            courses: EntryList::from_json(row.courses.as_ref()),
            address,
            id: row.id,
            user_type: row.user_type,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            city_id: row.city_id,
            location: row.location,
            birth_date: row.birth_date,
            is_verified: row.is_verified,
            has_experience: row.has_experience,
            skills: row.skills,
            driver_license_categories: row.driver_license_categories,
            summary: row.summary,
            created_at: row.created_at,
        }
    }
}

/// GET /api/v1/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileView>, AppError> {
    let profile = state
        .profiles
        .fetch_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;
    Ok(Json(profile.into()))
}

/// POST /api/v1/profiles/:id/:collection
///
/// Body is the draft for that collection. Returns the stored entry with its
/// newly assigned id.
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path((user_id, collection)): Path<(Uuid, String)>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let collection = parse_collection(&collection)?;
    let entry = build_entry(collection, body, Uuid::new_v4(), Utc::now().date_naive())?;

    if !state
        .profiles
        .append_entry(user_id, collection, entry.clone())
        .await?
    {
        return Err(AppError::NotFound(format!("Profile {user_id} not found")));
    }

    info!("Added {} entry to profile {user_id}", collection.column());
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/v1/profiles/:id/:collection/:entry_id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path((user_id, collection, entry_id)): Path<(Uuid, String, Uuid)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let collection = parse_collection(&collection)?;
    let entry = build_entry(collection, body, entry_id, Utc::now().date_naive())?;

    if !state
        .profiles
        .replace_entry(user_id, collection, entry_id, entry.clone())
        .await?
    {
        return Err(AppError::NotFound(format!("Entry {entry_id} not found")));
    }
    Ok(Json(entry))
}

/// DELETE /api/v1/profiles/:id/:collection/:entry_id
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((user_id, collection, entry_id)): Path<(Uuid, String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let collection = parse_collection(&collection)?;
    if !state
        .profiles
        .remove_entry(user_id, collection, entry_id)
        .await?
    {
        return Err(AppError::NotFound(format!("Entry {entry_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn parse_collection(raw: &str) -> Result<EntryCollection, AppError> {
    EntryCollection::parse(raw)
        .ok_or_else(|| AppError::NotFound(format!("Unknown profile collection '{raw}'")))
}

/// Decodes and validates the draft for `collection`, returning the stored
/// JSON form of the entry under `id`.
fn build_entry(
    collection: EntryCollection,
    body: Value,
    id: Uuid,
    today: NaiveDate,
) -> Result<Value, AppError> {
    let invalid_body = |e: serde_json::Error| AppError::Validation(format!("Malformed entry: {e}"));
    let invalid_fields = |errors| AppError::FieldValidation {
        scope: collection.column().to_string(),
        errors,
    };

    let stored = match collection {
        EntryCollection::Experiences => {
            let draft: ExperienceDraft = serde_json::from_value(body).map_err(invalid_body)?;
            let data = draft.validate(today).map_err(invalid_fields)?;
            serde_json::to_value(ProfileEntry { id, data })
        }
        EntryCollection::Education => {
            let draft: EducationDraft = serde_json::from_value(body).map_err(invalid_body)?;
            let data = draft.validate().map_err(invalid_fields)?;
            serde_json::to_value(ProfileEntry { id, data })
        }
        EntryCollection::Courses => {
            let draft: CourseDraft = serde_json::from_value(body).map_err(invalid_body)?;
            let data = draft.validate().map_err(invalid_fields)?;
            serde_json::to_value(ProfileEntry { id, data })
        }
    };
    stored.map_err(|e| AppError::Internal(e.into()))
}
