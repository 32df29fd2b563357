//! Brand text materialized on disk for a single execution attempt.

use std::io;
use std::path::Path;

use tempfile::TempDir;

/// File name the generator looks for inside the brand directory.
pub const BRAND_FILE_NAME: &str = "BRAND.md";

const BRAND_DIR_PREFIX: &str = "imagegen-job-brand-";

/// A temporary directory containing exactly one brand text file.
///
/// The directory is removed when the value is dropped, so holding it for the
/// duration of one generator invocation scopes it to that attempt on every
/// exit path. [`BrandContext::close`] removes it eagerly and reports errors.
#[derive(Debug)]
pub struct BrandContext {
    dir: TempDir,
}

impl BrandContext {
    /// Write `content` to a fresh temporary directory.
    ///
    /// Returns `Ok(None)` when the content is blank; no directory is created.
    pub fn materialize(content: &str) -> io::Result<Option<Self>> {
        if content.trim().is_empty() {
            return Ok(None);
        }
        let dir = tempfile::Builder::new().prefix(BRAND_DIR_PREFIX).tempdir()?;
        std::fs::write(dir.path().join(BRAND_FILE_NAME), content)?;
        Ok(Some(Self { dir }))
    }

    /// Directory passed to the generator.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_creates_nothing() {
        assert!(BrandContext::materialize("  \n ").unwrap().is_none());
    }

    #[test]
    fn writes_single_brand_file() {
        let ctx = BrandContext::materialize("Use teal accents.").unwrap().unwrap();
        let entries: Vec<_> = std::fs::read_dir(ctx.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, [BRAND_FILE_NAME]);
        assert_eq!(
            std::fs::read_to_string(ctx.path().join(BRAND_FILE_NAME)).unwrap(),
            "Use teal accents."
        );
    }

    #[test]
    fn drop_and_close_remove_the_directory() {
        let ctx = BrandContext::materialize("x").unwrap().unwrap();
        let path = ctx.path().to_path_buf();
        drop(ctx);
        assert!(!path.exists());

        let ctx = BrandContext::materialize("y").unwrap().unwrap();
        let path = ctx.path().to_path_buf();
        ctx.close().unwrap();
        assert!(!path.exists());
    }
}
