//! Repository for the `brands` table.

use chrono::Utc;
use imagegen_core::error::CoreError;
use imagegen_core::naming::{require_slug, slugify};
use imagegen_core::types::DbId;

use crate::error::RepoError;
use crate::models::brand::{Brand, CreateBrand};
use crate::DbPool;

const COLUMNS: &str = "id, name, slug, content, created_at, updated_at";

/// Provides CRUD operations for brands.
pub struct BrandRepo;

impl BrandRepo {
    /// Insert a brand. Its slug is derived from the trimmed name.
    ///
    /// Fails with `Validation` when the name slugifies to nothing and with
    /// `Conflict` when the slug is taken.
    pub async fn create(pool: &DbPool, input: &CreateBrand) -> Result<Brand, RepoError> {
        let name = input.name.trim();
        let slug = require_slug("brand", name)?;
        let now = Utc::now();

        let query = format!(
            "INSERT INTO brands (name, slug, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Brand>(&query)
            .bind(name)
            .bind(&slug)
            .bind(&input.content)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
            .map_err(|e| RepoError::conflict_on_unique(e, format!("brand '{slug}' already exists")))
    }

    /// Look up a brand by slug. The input is normalized first.
    pub async fn find_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE slug = ?");
        sqlx::query_as::<_, Brand>(&query)
            .bind(slugify(slug))
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &DbPool) -> Result<Vec<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands ORDER BY slug ASC");
        sqlx::query_as::<_, Brand>(&query).fetch_all(pool).await
    }

    /// Replace a brand's text. Unknown slug -> `NotFound`.
    pub async fn update_content(
        pool: &DbPool,
        slug: &str,
        content: &str,
    ) -> Result<Brand, RepoError> {
        let slug = slugify(slug);
        let query = format!(
            "UPDATE brands SET content = ?, updated_at = ? WHERE slug = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Brand>(&query)
            .bind(content)
            .bind(Utc::now())
            .bind(&slug)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Brand", slug).into())
    }

    /// Delete a brand. Projects and work items referencing it keep existing
    /// with their reference nulled.
    pub async fn delete(pool: &DbPool, slug: &str) -> Result<(), RepoError> {
        let slug = slugify(slug);
        let result = sqlx::query("DELETE FROM brands WHERE slug = ?")
            .bind(&slug)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Brand", slug).into());
        }
        Ok(())
    }

    /// Resolve an optional brand slug to its id. A blank slug means "none".
    pub(crate) async fn resolve_id(
        pool: &DbPool,
        slug: Option<&str>,
    ) -> Result<Option<DbId>, RepoError> {
        let Some(slug) = slug.map(slugify).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let id: Option<DbId> = sqlx::query_scalar("SELECT id FROM brands WHERE slug = ?")
            .bind(&slug)
            .fetch_optional(pool)
            .await?;
        match id {
            Some(id) => Ok(Some(id)),
            None => Err(CoreError::not_found("Brand", slug).into()),
        }
    }
}
