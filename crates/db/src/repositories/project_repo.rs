//! Repository for the `projects` table.

use chrono::Utc;
use imagegen_core::error::CoreError;
use imagegen_core::naming::{require_slug, slugify};
use imagegen_core::types::DbId;

use crate::error::RepoError;
use crate::models::project::{CreateProject, Project};
use crate::repositories::BrandRepo;
use crate::DbPool;

/// Projects joined with their default brand slug and work item count.
const SELECT: &str = "\
    SELECT p.id, p.name, p.slug, p.default_brand_id, \
           b.slug AS default_brand_slug, \
           (SELECT COUNT(*) FROM work_items w WHERE w.project_id = p.id) AS work_item_count, \
           p.created_at, p.updated_at \
    FROM projects p \
    LEFT JOIN brands b ON b.id = p.default_brand_id";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project, optionally pointing at a default brand.
    ///
    /// Unknown brand -> `NotFound`, empty name -> `Validation`, taken slug ->
    /// `Conflict`.
    pub async fn create(pool: &DbPool, input: &CreateProject) -> Result<Project, RepoError> {
        let name = input.name.trim();
        let slug = require_slug("project", name)?;
        let brand_id = BrandRepo::resolve_id(pool, input.default_brand_slug.as_deref()).await?;
        let now = Utc::now();

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO projects (name, slug, default_brand_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(name)
        .bind(&slug)
        .bind(brand_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| RepoError::conflict_on_unique(e, format!("project '{slug}' already exists")))?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project", id).into())
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("{SELECT} WHERE p.id = ?");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a project by slug. The input is normalized first.
    pub async fn find_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("{SELECT} WHERE p.slug = ?");
        sqlx::query_as::<_, Project>(&query)
            .bind(slugify(slug))
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("{SELECT} ORDER BY p.slug ASC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Delete a project together with its work items, jobs, runs and run
    /// image rows. Files on disk are left alone.
    pub async fn delete(pool: &DbPool, slug: &str) -> Result<(), RepoError> {
        let slug = slugify(slug);
        let result = sqlx::query("DELETE FROM projects WHERE slug = ?")
            .bind(&slug)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Project", slug).into());
        }
        Ok(())
    }

    /// Resolve a project slug to its id, or `NotFound`.
    pub(crate) async fn require_id(pool: &DbPool, slug: &str) -> Result<DbId, RepoError> {
        let slug = slugify(slug);
        let id: Option<DbId> = sqlx::query_scalar("SELECT id FROM projects WHERE slug = ?")
            .bind(&slug)
            .fetch_optional(pool)
            .await?;
        id.ok_or_else(|| CoreError::not_found("Project", slug).into())
    }
}
