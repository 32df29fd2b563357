use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use imagegen_core::types::{DbId, Timestamp};

/// Work item type used when none is given.
pub const DEFAULT_WORK_ITEM_TYPE: &str = "generic";

/// A `work_items` row joined with its project slug and brand override slug.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkItem {
    pub id: DbId,
    pub project_id: DbId,
    pub project_slug: String,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub prompt: String,
    pub brand_id: Option<DbId>,
    pub brand_slug: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a work item under a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub prompt: String,
    /// Brand override; takes precedence over the project default.
    pub brand_slug: Option<String>,
}

/// DTO for replacing a work item's prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePrompt {
    pub prompt: String,
}
