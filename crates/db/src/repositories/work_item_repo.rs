//! Repository for the `work_items` table.

use chrono::Utc;
use imagegen_core::error::CoreError;
use imagegen_core::generation::validate_prompt;
use imagegen_core::naming::{require_slug, slugify};
use imagegen_core::types::DbId;

use crate::error::RepoError;
use crate::models::work_item::{CreateWorkItem, WorkItem, DEFAULT_WORK_ITEM_TYPE};
use crate::repositories::{BrandRepo, ProjectRepo};
use crate::DbPool;

/// Work items joined with their project slug and brand override slug.
const SELECT: &str = "\
    SELECT w.id, w.project_id, p.slug AS project_slug, w.name, w.slug, \
           w.type AS item_type, w.prompt, w.brand_id, b.slug AS brand_slug, \
           w.created_at, w.updated_at \
    FROM work_items w \
    JOIN projects p ON p.id = w.project_id \
    LEFT JOIN brands b ON b.id = w.brand_id";

/// Provides CRUD operations for work items.
pub struct WorkItemRepo;

impl WorkItemRepo {
    /// Insert a work item under `project_slug`.
    ///
    /// The type defaults to `generic`. An empty prompt or name is a
    /// `Validation` error; an unknown project or brand is `NotFound`; a slug
    /// already used in the same project is a `Conflict`.
    pub async fn create(
        pool: &DbPool,
        project_slug: &str,
        input: &CreateWorkItem,
    ) -> Result<WorkItem, RepoError> {
        let name = input.name.trim();
        let slug = require_slug("work item", name)?;
        let prompt = validate_prompt(&input.prompt)?;
        let item_type = input
            .item_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_WORK_ITEM_TYPE);

        let project_id = ProjectRepo::require_id(pool, project_slug).await?;
        let brand_id = BrandRepo::resolve_id(pool, input.brand_slug.as_deref()).await?;
        let now = Utc::now();

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO work_items \
                 (project_id, name, slug, type, prompt, brand_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(project_id)
        .bind(name)
        .bind(&slug)
        .bind(item_type)
        .bind(&prompt)
        .bind(brand_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            RepoError::conflict_on_unique(
                e,
                format!("work item '{slug}' already exists in this project"),
            )
        })?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found("WorkItem", id).into())
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<WorkItem>, sqlx::Error> {
        let query = format!("{SELECT} WHERE w.id = ?");
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a work item by project slug and item slug.
    pub async fn find(
        pool: &DbPool,
        project_slug: &str,
        item_slug: &str,
    ) -> Result<Option<WorkItem>, sqlx::Error> {
        let query = format!("{SELECT} WHERE p.slug = ? AND w.slug = ?");
        sqlx::query_as::<_, WorkItem>(&query)
            .bind(slugify(project_slug))
            .bind(slugify(item_slug))
            .fetch_optional(pool)
            .await
    }

    /// List a project's work items by slug. Unknown project -> `NotFound`.
    pub async fn list(pool: &DbPool, project_slug: &str) -> Result<Vec<WorkItem>, RepoError> {
        let project_id = ProjectRepo::require_id(pool, project_slug).await?;
        let query = format!("{SELECT} WHERE w.project_id = ? ORDER BY w.slug ASC");
        let items = sqlx::query_as::<_, WorkItem>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await?;
        Ok(items)
    }

    /// Replace a work item's prompt. Jobs already claimed keep the prompt
    /// they were claimed with.
    pub async fn update_prompt(
        pool: &DbPool,
        project_slug: &str,
        item_slug: &str,
        prompt: &str,
    ) -> Result<WorkItem, RepoError> {
        let prompt = validate_prompt(prompt)?;
        let id = Self::require_id(pool, project_slug, item_slug).await?;

        sqlx::query("UPDATE work_items SET prompt = ?, updated_at = ? WHERE id = ?")
            .bind(&prompt)
            .bind(Utc::now())
            .bind(id)
            .execute(pool)
            .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found("WorkItem", id).into())
    }

    /// Resolve `(project, item)` slugs to the work item id, or `NotFound`.
    pub(crate) async fn require_id(
        pool: &DbPool,
        project_slug: &str,
        item_slug: &str,
    ) -> Result<DbId, RepoError> {
        let (project_slug, item_slug) = (slugify(project_slug), slugify(item_slug));
        let id: Option<DbId> = sqlx::query_scalar(
            "SELECT w.id FROM work_items w \
             JOIN projects p ON p.id = w.project_id \
             WHERE p.slug = ? AND w.slug = ?",
        )
        .bind(&project_slug)
        .bind(&item_slug)
        .fetch_optional(pool)
        .await?;
        id.ok_or_else(|| CoreError::not_found("WorkItem", format!("{project_slug}/{item_slug}")).into())
    }
}
