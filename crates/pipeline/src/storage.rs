//! On-disk layout under the data root.
//!
//! ```text
//! {root}/imagegen.db
//! {root}/images/{project}/{work-item}/run-{id}/<generated files>
//! ```
//!
//! Paths stored in the database are relative to the root and always use `/`
//! separators, so the root can move without rewriting rows.

use std::path::{Path, PathBuf};

use imagegen_core::error::CoreError;
use imagegen_core::types::DbId;
use imagegen_db::repositories::RunImageRepo;
use imagegen_db::{DbPool, RepoError, DATABASE_FILE_NAME};

/// Top-level directory holding every generated image.
const IMAGES_DIR: &str = "images";

/// Root directory owning the database file and generated images.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing.
    pub async fn ensure_exists(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }

    /// Root-relative directory for one run: `images/{project}/{item}/run-{id}`.
    pub fn run_relative_dir(project_slug: &str, item_slug: &str, run_id: DbId) -> String {
        format!("{IMAGES_DIR}/{project_slug}/{item_slug}/run-{run_id}")
    }

    /// Absolute path for a stored root-relative path.
    ///
    /// Empty, `.` and `..` components are dropped so a stored path can never
    /// point outside the root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .fold(self.root.clone(), |path, component| path.join(component))
    }

    /// Absolute path of a harvested image. Unknown id -> `NotFound`.
    pub async fn image_path(&self, pool: &DbPool, image_id: DbId) -> Result<PathBuf, RepoError> {
        let image = RunImageRepo::find_by_id(pool, image_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Image", image_id))?;
        Ok(self.resolve(&image.rel_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dir_layout() {
        assert_eq!(
            DataRoot::run_relative_dir("demo", "icon", 7),
            "images/demo/icon/run-7"
        );
    }

    #[test]
    fn resolve_joins_components() {
        let root = DataRoot::new("/srv/data");
        assert_eq!(
            root.resolve("images/demo/icon/run-7/a.png"),
            PathBuf::from("/srv/data/images/demo/icon/run-7/a.png")
        );
        assert_eq!(root.database_path(), PathBuf::from("/srv/data/imagegen.db"));
    }

    #[test]
    fn resolve_stays_under_root() {
        let root = DataRoot::new("/srv/data");
        assert_eq!(
            root.resolve("../../etc/passwd"),
            PathBuf::from("/srv/data/etc/passwd")
        );
        assert_eq!(root.resolve("/images//./a.png"), PathBuf::from("/srv/data/images/a.png"));
    }
}
