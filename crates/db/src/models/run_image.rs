use imagegen_core::formats::ImageFormat;
use imagegen_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `run_images` table: one harvested output file.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RunImage {
    pub id: DbId,
    pub run_id: DbId,
    pub filename: String,
    /// Path relative to the data root, `/`-separated.
    pub rel_path: String,
    pub format: String,
    pub created_at: Timestamp,
}

/// Input for recording a harvested file.
#[derive(Debug, Clone)]
pub struct CreateRunImage {
    pub run_id: DbId,
    pub filename: String,
    pub rel_path: String,
    pub format: ImageFormat,
}
