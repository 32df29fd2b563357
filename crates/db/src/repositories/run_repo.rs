//! Repository for the `runs` table.

use chrono::Utc;
use imagegen_core::error::CoreError;
use imagegen_core::types::DbId;
use sqlx::types::Json;

use crate::error::RepoError;
use crate::models::run::{CreateRun, Run};
use crate::models::status::{JobStatus, RunStatus};
use crate::repositories::JobRepo;
use crate::DbPool;

const COLUMNS: &str = "\
    id, job_id, work_item_id, prompt_snapshot, settings_snapshot, status, \
    error_message, created_at, finished_at";

/// Provides lifecycle operations for runs.
pub struct RunRepo;

impl RunRepo {
    /// Create the run of a `running` job and link it back onto the job.
    ///
    /// A job has at most one run: a second attempt fails with `Conflict`, as
    /// does creating a run for a job that is not `running`. Unknown job ->
    /// `NotFound`.
    pub async fn create(pool: &DbPool, input: &CreateRun) -> Result<Run, RepoError> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO runs \
                 (job_id, work_item_id, prompt_snapshot, settings_snapshot, status, created_at) \
             SELECT id, work_item_id, ?, ?, ?, ? FROM jobs WHERE id = ? AND status = ? \
             RETURNING {COLUMNS}"
        );
        let run = sqlx::query_as::<_, Run>(&query)
            .bind(&input.prompt_snapshot)
            .bind(Json(&input.settings_snapshot))
            .bind(RunStatus::Running.as_str())
            .bind(Utc::now())
            .bind(input.job_id)
            .bind(JobStatus::Running.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                RepoError::conflict_on_unique(e, format!("job {} already has a run", input.job_id))
            })?;

        let Some(run) = run else {
            drop(tx);
            return Err(match JobRepo::find_by_id(pool, input.job_id).await? {
                None => CoreError::not_found("Job", input.job_id),
                Some(job) => CoreError::Conflict(format!(
                    "job {} is {}, not running",
                    input.job_id, job.status
                )),
            }
            .into());
        };

        sqlx::query("UPDATE jobs SET run_id = ? WHERE id = ?")
            .bind(run.id)
            .bind(input.job_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(run)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE id = ?");
        sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The run of a job, if one was created.
    pub async fn find_by_job(pool: &DbPool, job_id: DbId) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE job_id = ?");
        sqlx::query_as::<_, Run>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_succeeded(pool: &DbPool, id: DbId) -> Result<(), RepoError> {
        Self::finish(pool, id, RunStatus::Succeeded, None).await
    }

    /// Record a failure with the trimmed `message`.
    pub async fn mark_failed(pool: &DbPool, id: DbId, message: &str) -> Result<(), RepoError> {
        Self::finish(pool, id, RunStatus::Failed, Some(message.trim())).await
    }

    async fn finish(
        pool: &DbPool,
        id: DbId,
        status: RunStatus,
        message: Option<&str>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE runs SET status = ?, error_message = ?, finished_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(status.as_str())
        .bind(message)
        .bind(Utc::now())
        .bind(id)
        .bind(RunStatus::Running.as_str())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(match Self::find_by_id(pool, id).await? {
                None => CoreError::not_found("Run", id),
                Some(run) => CoreError::Conflict(format!(
                    "run {id} cannot move from {} to {status}",
                    run.status
                )),
            }
            .into());
        }
        Ok(())
    }
}
