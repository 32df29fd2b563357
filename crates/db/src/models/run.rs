use imagegen_core::generation::GenerationSettings;
use imagegen_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

use super::status::RunStatus;

/// A row from the `runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub id: DbId,
    pub job_id: DbId,
    pub work_item_id: DbId,
    /// Prompt exactly as handed to the generator.
    pub prompt_snapshot: String,
    pub settings_snapshot: Json<GenerationSettings>,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

/// Input for creating the run of a claimed job.
#[derive(Debug, Clone)]
pub struct CreateRun {
    pub job_id: DbId,
    pub prompt_snapshot: String,
    pub settings_snapshot: GenerationSettings,
}
