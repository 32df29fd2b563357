//! Repository for the `jobs` table.
//!
//! Jobs are created `queued` by the enqueue path and afterwards only moved
//! forward by the worker: `queued -> running` through [`JobRepo::claim_next`],
//! then `running -> succeeded | failed`. Every transition is a conditional
//! UPDATE on the expected current status, so a transition that lost a race
//! or would move backwards affects zero rows and surfaces as `Conflict`.

use chrono::Utc;
use imagegen_core::error::CoreError;
use imagegen_core::generation::{GenerationSettings, GenerationSettingsInput};
use imagegen_core::types::DbId;
use sqlx::types::Json;
use sqlx::FromRow;

use crate::error::RepoError;
use crate::models::job::{ClaimedJob, Job};
use crate::models::run_image::RunImage;
use crate::models::status::JobStatus;
use crate::repositories::WorkItemRepo;
use crate::DbPool;

/// Jobs joined with their work item and project names/slugs.
const SELECT: &str = "\
    SELECT j.id, j.work_item_id, j.run_id, j.status, j.payload, j.error_message, \
           j.created_at, j.started_at, j.finished_at, \
           p.slug AS project_slug, p.name AS project_name, \
           w.slug AS work_item_slug, w.name AS work_item_name \
    FROM jobs j \
    JOIN work_items w ON w.id = j.work_item_id \
    JOIN projects p ON p.id = w.project_id";

/// Maximum page size for job listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for the global job listing.
pub const DEFAULT_LIMIT: i64 = 50;

/// Default page size for a single work item's jobs.
pub const DEFAULT_WORK_ITEM_LIMIT: i64 = 10;

/// Everything the worker needs, read in the claiming transaction.
#[derive(Debug, FromRow)]
struct ClaimRow {
    job_id: DbId,
    work_item_id: DbId,
    project_slug: String,
    work_item_slug: String,
    prompt: String,
    brand_content: Option<String>,
    payload: String,
}

/// Provides enqueue, polling and lifecycle operations for jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a `queued` job for the work item `project_slug/item_slug`.
    ///
    /// Settings are normalized before anything is written: malformed
    /// settings fail with `Validation` and an unknown work item with
    /// `NotFound`; in both cases no row is created.
    pub async fn enqueue(
        pool: &DbPool,
        project_slug: &str,
        item_slug: &str,
        settings: &GenerationSettingsInput,
    ) -> Result<Job, RepoError> {
        let settings = settings.normalize()?;
        let work_item_id = WorkItemRepo::require_id(pool, project_slug, item_slug).await?;

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO jobs (work_item_id, status, payload, created_at) \
             VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(work_item_id)
        .bind(JobStatus::Queued.as_str())
        .bind(Json(&settings))
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        tracing::debug!(job_id = id, work_item_id, "Job enqueued");

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Job", id).into())
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("{SELECT} WHERE j.id = ?");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs newest first. `limit` defaults to 50 and is capped at 100.
    pub async fn list(pool: &DbPool, limit: Option<i64>) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!("{SELECT} ORDER BY j.created_at DESC, j.id DESC LIMIT ?");
        sqlx::query_as::<_, Job>(&query)
            .bind(clamp_limit(limit, DEFAULT_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// List one work item's jobs newest first. `limit` defaults to 10 and is
    /// capped at 100. Unknown work item -> `NotFound`.
    pub async fn list_for_work_item(
        pool: &DbPool,
        project_slug: &str,
        item_slug: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Job>, RepoError> {
        let work_item_id = WorkItemRepo::require_id(pool, project_slug, item_slug).await?;
        let query = format!(
            "{SELECT} WHERE j.work_item_id = ? ORDER BY j.created_at DESC, j.id DESC LIMIT ?"
        );
        let jobs = sqlx::query_as::<_, Job>(&query)
            .bind(work_item_id)
            .bind(clamp_limit(limit, DEFAULT_WORK_ITEM_LIMIT))
            .fetch_all(pool)
            .await?;
        Ok(jobs)
    }

    /// Atomically claim the oldest `queued` job and flip it to `running`.
    ///
    /// The status flip is the first statement of the transaction and is
    /// conditional on the row still being `queued`, so two concurrent
    /// claimers can never both win the same job. The execution context
    /// (prompt, resolved brand text, settings) is read in the same
    /// transaction. Returns `Ok(None)` when nothing is queued.
    ///
    /// A job whose payload cannot be decoded is marked `failed` in the same
    /// transaction and reported as `Validation`.
    pub async fn claim_next(pool: &DbPool) -> Result<Option<ClaimedJob>, RepoError> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let claimed: Option<DbId> = sqlx::query_scalar(
            "UPDATE jobs SET status = ?, started_at = ? \
             WHERE id = ( \
                 SELECT id FROM jobs WHERE status = ? \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
             ) AND status = ? \
             RETURNING id",
        )
        .bind(JobStatus::Running.as_str())
        .bind(now)
        .bind(JobStatus::Queued.as_str())
        .bind(JobStatus::Queued.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(job_id) = claimed else {
            tx.commit().await?;
            return Ok(None);
        };

        // The work item override wins over the project default brand.
        let row = sqlx::query_as::<_, ClaimRow>(
            "SELECT j.id AS job_id, j.work_item_id, \
                    p.slug AS project_slug, w.slug AS work_item_slug, w.prompt, \
                    COALESCE(bw.content, bp.content) AS brand_content, \
                    j.payload \
             FROM jobs j \
             JOIN work_items w ON w.id = j.work_item_id \
             JOIN projects p ON p.id = w.project_id \
             LEFT JOIN brands bw ON bw.id = w.brand_id \
             LEFT JOIN brands bp ON bp.id = p.default_brand_id \
             WHERE j.id = ?",
        )
        .bind(job_id)
        .fetch_one(&mut *tx)
        .await?;

        let settings = match serde_json::from_str::<GenerationSettings>(&row.payload) {
            Ok(settings) => settings,
            Err(e) => {
                let message = format!("malformed job payload: {e}");
                sqlx::query(
                    "UPDATE jobs SET status = ?, error_message = ?, finished_at = ? WHERE id = ?",
                )
                .bind(JobStatus::Failed.as_str())
                .bind(&message)
                .bind(now)
                .bind(job_id)
                .execute(&mut *tx)
                .await?;
                tx.commit().await?;
                tracing::warn!(job_id, error = %e, "Claimed job has a malformed payload");
                return Err(CoreError::Validation(format!("job {job_id}: {message}")).into());
            }
        };

        tx.commit().await?;

        Ok(Some(ClaimedJob {
            job_id: row.job_id,
            work_item_id: row.work_item_id,
            project_slug: row.project_slug,
            work_item_slug: row.work_item_slug,
            prompt: row.prompt,
            brand_content: row.brand_content,
            settings,
        }))
    }

    /// Move a `running` job to `succeeded`.
    pub async fn mark_succeeded(pool: &DbPool, id: DbId) -> Result<(), RepoError> {
        Self::finish(pool, id, JobStatus::Succeeded, None).await
    }

    /// Move a `running` job to `failed`, recording the trimmed `message`.
    pub async fn mark_failed(pool: &DbPool, id: DbId, message: &str) -> Result<(), RepoError> {
        Self::finish(pool, id, JobStatus::Failed, Some(message.trim())).await
    }

    async fn finish(
        pool: &DbPool,
        id: DbId,
        status: JobStatus,
        message: Option<&str>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE jobs SET status = ?, error_message = ?, finished_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(status.as_str())
        .bind(message)
        .bind(Utc::now())
        .bind(id)
        .bind(JobStatus::Running.as_str())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(match Self::find_by_id(pool, id).await? {
                None => CoreError::not_found("Job", id),
                Some(job) => CoreError::Conflict(format!(
                    "job {id} cannot move from {} to {status}",
                    job.status
                )),
            }
            .into());
        }
        Ok(())
    }

    /// Number of jobs currently `running`.
    ///
    /// At process start these are orphans of a previous process.
    pub async fn count_running(pool: &DbPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = ?")
            .bind(JobStatus::Running.as_str())
            .fetch_one(pool)
            .await
    }

    /// Images harvested for a job's run, in creation order.
    pub async fn job_images(pool: &DbPool, job_id: DbId) -> Result<Vec<RunImage>, sqlx::Error> {
        sqlx::query_as::<_, RunImage>(
            "SELECT ri.id, ri.run_id, ri.filename, ri.rel_path, ri.format, ri.created_at \
             FROM run_images ri \
             JOIN runs r ON r.id = ri.run_id \
             WHERE r.job_id = ? \
             ORDER BY ri.created_at ASC, ri.id ASC",
        )
        .bind(job_id)
        .fetch_all(pool)
        .await
    }
}

/// Apply a default to a requested page size and clamp it to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    match limit {
        Some(n) if n > 0 => n.min(MAX_LIMIT),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_and_cap() {
        assert_eq!(clamp_limit(None, DEFAULT_LIMIT), 50);
        assert_eq!(clamp_limit(None, DEFAULT_WORK_ITEM_LIMIT), 10);
        assert_eq!(clamp_limit(Some(0), DEFAULT_LIMIT), 50);
        assert_eq!(clamp_limit(Some(-3), DEFAULT_LIMIT), 50);
        assert_eq!(clamp_limit(Some(7), DEFAULT_LIMIT), 7);
        assert_eq!(clamp_limit(Some(1000), DEFAULT_LIMIT), MAX_LIMIT);
    }
}
