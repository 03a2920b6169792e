use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::listings::lifecycle::ListingStatus;
use crate::models::listing::JobListingRow;

/// Column list for `JobListingRow`; expects `jobs` aliased `j` and
/// `profiles` aliased `p`.
const LISTING_COLUMNS: &str = r#"
    j.id, j.author_id, j.title, j.company, j.location, j.city_id, j.sector_id,
    j.salary, j.description, j.status, j.views_count, j.likes_count,
    j.comments_count, j.accepts_platform_applications, j.created_at,
    p.is_verified AS author_verified
"#;

/// Fields a recruiter supplies when posting a listing.
pub struct NewListing<'a> {
    pub author_id: Uuid,
    pub title: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    pub city_id: Option<i32>,
    pub sector_id: Option<i32>,
    pub salary: Option<&'a str>,
    pub description: &'a str,
    pub accepts_platform_applications: bool,
}

/// Active listings, optionally narrowed to one city. Read failures are
/// logged and yield an empty list.
pub async fn fetch_active_listings(pool: &PgPool, city_id: Option<i32>) -> Vec<JobListingRow> {
    let sql = format!(
        r#"
        SELECT {LISTING_COLUMNS}
        FROM jobs j
        LEFT JOIN profiles p ON p.id = j.author_id
        WHERE j.status = 'active' AND ($1::int IS NULL OR j.city_id = $1)
        "#
    );
    match sqlx::query_as::<_, JobListingRow>(&sql)
        .bind(city_id)
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch active listings: {e}");
            Vec::new()
        }
    }
}

pub async fn get_listing(pool: &PgPool, id: Uuid) -> Result<Option<JobListingRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {LISTING_COLUMNS}
        FROM jobs j
        LEFT JOIN profiles p ON p.id = j.author_id
        WHERE j.id = $1
        "#
    );
    sqlx::query_as::<_, JobListingRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Every listing an author posted, newest first. Degrades to empty on error.
pub async fn listings_by_author(pool: &PgPool, author_id: Uuid) -> Vec<JobListingRow> {
    let sql = format!(
        r#"
        SELECT {LISTING_COLUMNS}
        FROM jobs j
        LEFT JOIN profiles p ON p.id = j.author_id
        WHERE j.author_id = $1
        ORDER BY j.created_at DESC
        "#
    );
    match sqlx::query_as::<_, JobListingRow>(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch listings for author {author_id}: {e}");
            Vec::new()
        }
    }
}

pub async fn create_listing(
    pool: &PgPool,
    listing: NewListing<'_>,
) -> Result<JobListingRow, sqlx::Error> {
    let sql = format!(
        r#"
        WITH j AS (
            INSERT INTO jobs
                (author_id, title, company, location, city_id, sector_id, salary,
                 description, status, views_count, likes_count, comments_count,
                 accepts_platform_applications)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active', 0, 0, 0, $9)
            RETURNING *
        )
        SELECT {LISTING_COLUMNS}
        FROM j
        LEFT JOIN profiles p ON p.id = j.author_id
        "#
    );
    let row = sqlx::query_as::<_, JobListingRow>(&sql)
        .bind(listing.author_id)
        .bind(listing.title)
        .bind(listing.company)
        .bind(listing.location)
        .bind(listing.city_id)
        .bind(listing.sector_id)
        .bind(listing.salary)
        .bind(listing.description)
        .bind(listing.accepts_platform_applications)
        .fetch_one(pool)
        .await?;

    info!("Created listing {} for author {}", row.id, row.author_id);
    Ok(row)
}

/// Compare-and-set status update. Returns false when the stored status no
/// longer matches `from`, i.e. another transition won the race.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    from: ListingStatus,
    to: ListingStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE jobs SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
    )
    .bind(id)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        info!("Listing {id} moved {} -> {}", from.as_str(), to.as_str());
    }
    Ok(result.rows_affected() == 1)
}
