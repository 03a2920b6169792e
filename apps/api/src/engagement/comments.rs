use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::engagement::CommentRow;

pub const MAX_COMMENT_CHARS: usize = 2000;

/// Trims and length-checks a comment body.
pub fn normalize_comment_body(body: &str) -> Result<String, AppError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("comment cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "comment exceeds {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Inserts a comment on an active listing and bumps `comments_count` in the
/// same statement. Returns None when the listing is missing or not active.
pub async fn create_comment(
    pool: &PgPool,
    listing_id: Uuid,
    author_id: Uuid,
    body: &str,
) -> Result<Option<CommentRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        WITH inserted AS (
            INSERT INTO job_comments (job_id, author_id, body)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM jobs WHERE id = $1 AND status = 'active')
            RETURNING id, job_id, author_id, body, created_at
        ),
        bumped AS (
            UPDATE jobs
            SET comments_count = COALESCE(comments_count, 0) + 1
            WHERE id IN (SELECT job_id FROM inserted)
        )
        SELECT id, job_id, author_id, body, created_at FROM inserted
        "#,
    )
    .bind(listing_id)
    .bind(author_id)
    .bind(body)
    .fetch_optional(pool)
    .await?;

    if let Some(comment) = &row {
        info!("Comment {} added to listing {listing_id}", comment.id);
    }
    Ok(row)
}

/// Comments on a listing, oldest first. Degrades to empty on error.
pub async fn list_comments(pool: &PgPool, listing_id: Uuid) -> Vec<CommentRow> {
    match sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT id, job_id, author_id, body, created_at
        FROM job_comments
        WHERE job_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(listing_id)
    .fetch_all(pool)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch comments for listing {listing_id}: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_trimmed() {
        assert_eq!(normalize_comment_body("  Tenho interesse!  ").unwrap(), "Tenho interesse!");
    }

    #[test]
    fn test_blank_body_rejected() {
        assert!(matches!(normalize_comment_body("   \n"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_overlong_body_rejected() {
        let body = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert!(normalize_comment_body(&body).is_err());
        assert!(normalize_comment_body(&"é".repeat(MAX_COMMENT_CHARS)).is_ok());
    }
}
