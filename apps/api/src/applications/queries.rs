//! Application persistence. Requires a unique index on
//! `applications (job_id, candidate_id)`.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::lifecycle::{ApplicationStatus, ApplicationType};
use crate::models::application::ApplicationRow;

const APPLICATION_COLUMNS: &str = r#"
    id, job_id, candidate_id, status, notes, resume_ref, application_type,
    created_at, updated_at
"#;

/// Inserts a pending application. Returns None when the candidate already
/// applied to this listing.
pub async fn create_application(
    pool: &PgPool,
    job_id: Uuid,
    candidate_id: Uuid,
    application_type: ApplicationType,
    resume_ref: Option<&str>,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO applications (job_id, candidate_id, status, application_type, resume_ref)
        VALUES ($1, $2, 'pending', $3, $4)
        ON CONFLICT (job_id, candidate_id) DO NOTHING
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(job_id)
        .bind(candidate_id)
        .bind(application_type.as_str())
        .bind(resume_ref)
        .fetch_optional(pool)
        .await?;

    if let Some(application) = &row {
        info!(
            "Candidate {candidate_id} applied to listing {job_id} ({})",
            application.application_type
        );
    }
    Ok(row)
}

pub async fn get_application(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
    sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Applications received by one listing, oldest first. Degrades to empty.
pub async fn applications_for_listing(pool: &PgPool, job_id: Uuid) -> Vec<ApplicationRow> {
    let sql = format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY created_at ASC"
    );
    match sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(job_id)
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch applications for listing {job_id}: {e}");
            Vec::new()
        }
    }
}

/// A candidate's applications, newest first. Degrades to empty.
pub async fn applications_for_candidate(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Vec<ApplicationRow> {
    let sql = format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE candidate_id = $1 ORDER BY created_at DESC"
    );
    match sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(candidate_id)
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch applications of candidate {candidate_id}: {e}");
            Vec::new()
        }
    }
}

/// Every application to any listing of `author_id`. Degrades to empty.
pub async fn applications_for_author(pool: &PgPool, author_id: Uuid) -> Vec<ApplicationRow> {
    let sql = format!(
        r#"
        SELECT {APPLICATION_COLUMNS}
        FROM applications
        WHERE job_id IN (SELECT id FROM jobs WHERE author_id = $1)
        "#
    );
    match sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch applications for author {author_id}: {e}");
            Vec::new()
        }
    }
}

/// Compare-and-set status update; None when the status moved underneath us.
pub async fn update_application_status(
    pool: &PgPool,
    id: Uuid,
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE applications
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(pool)
        .await?;
    if row.is_some() {
        info!("Application {id} moved {} -> {}", from.as_str(), to.as_str());
    }
    Ok(row)
}

pub async fn update_notes(
    pool: &PgPool,
    id: Uuid,
    notes: Option<&str>,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE applications
        SET notes = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .bind(notes)
        .fetch_optional(pool)
        .await
}
