use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use imagegen_core::types::{DbId, Timestamp};

/// A `projects` row joined with its default brand slug and work item count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub default_brand_id: Option<DbId>,
    pub default_brand_slug: Option<String>,
    pub work_item_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    /// Brand applied to work items that have no override.
    pub default_brand_slug: Option<String>,
}
