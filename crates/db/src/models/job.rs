//! Generation job models.

use imagegen_core::generation::GenerationSettings;
use imagegen_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use super::status::JobStatus;

/// A `jobs` row joined with the names and slugs of its work item and project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub work_item_id: DbId,
    pub run_id: Option<DbId>,
    pub status: JobStatus,
    pub payload: Json<GenerationSettings>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub project_slug: String,
    pub project_name: String,
    pub work_item_slug: String,
    pub work_item_name: String,
}

/// Execution context returned by a successful claim.
///
/// Everything is read in the same transaction that flips the job to
/// `running`, so later catalogue edits do not leak into this attempt.
#[derive(Debug, Clone)]
pub struct ClaimedJob {
    pub job_id: DbId,
    pub work_item_id: DbId,
    pub project_slug: String,
    pub work_item_slug: String,
    pub prompt: String,
    /// Work item override if set, otherwise the project default.
    pub brand_content: Option<String>,
    pub settings: GenerationSettings,
}
