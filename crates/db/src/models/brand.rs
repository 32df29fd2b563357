use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use imagegen_core::types::{DbId, Timestamp};

/// A row from the `brands` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Brand {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a brand. The slug is derived from `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBrand {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// DTO for replacing a brand's text.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBrand {
    pub content: String,
}
