//! Repository for the `run_images` table.

use chrono::Utc;
use imagegen_core::types::DbId;

use crate::error::RepoError;
use crate::models::run_image::{CreateRunImage, RunImage};
use crate::repositories::job_repo::clamp_limit;
use crate::repositories::WorkItemRepo;
use crate::DbPool;

const COLUMNS: &str = "id, run_id, filename, rel_path, format, created_at";

/// Default number of recent images listed for a work item.
pub const DEFAULT_WORK_ITEM_IMAGE_LIMIT: i64 = 40;

/// Provides insert and lookup operations for harvested images.
pub struct RunImageRepo;

impl RunImageRepo {
    /// Record one harvested file. The format is stored as its canonical tag.
    pub async fn create(pool: &DbPool, input: &CreateRunImage) -> Result<RunImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO run_images (run_id, filename, rel_path, format, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RunImage>(&query)
            .bind(input.run_id)
            .bind(&input.filename)
            .bind(&input.rel_path)
            .bind(input.format.as_str())
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<RunImage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM run_images WHERE id = ?");
        sqlx::query_as::<_, RunImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_run(pool: &DbPool, run_id: DbId) -> Result<Vec<RunImage>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM run_images WHERE run_id = ? ORDER BY created_at, id");
        sqlx::query_as::<_, RunImage>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }

    /// Most recent images across all runs of a work item, newest first.
    /// `limit` defaults to 40 and is capped at 100.
    pub async fn list_for_work_item(
        pool: &DbPool,
        project_slug: &str,
        item_slug: &str,
        limit: Option<i64>,
    ) -> Result<Vec<RunImage>, RepoError> {
        let work_item_id = WorkItemRepo::require_id(pool, project_slug, item_slug).await?;
        let images = sqlx::query_as::<_, RunImage>(
            "SELECT ri.id, ri.run_id, ri.filename, ri.rel_path, ri.format, ri.created_at \
             FROM run_images ri \
             JOIN runs r ON r.id = ri.run_id \
             WHERE r.work_item_id = ? \
             ORDER BY ri.created_at DESC, ri.id DESC \
             LIMIT ?",
        )
        .bind(work_item_id)
        .bind(clamp_limit(limit, DEFAULT_WORK_ITEM_IMAGE_LIMIT))
        .fetch_all(pool)
        .await?;
        Ok(images)
    }
}
