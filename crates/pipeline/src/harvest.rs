//! Discovery of generated images in a run's output directory.

use std::io;
use std::path::Path;

use imagegen_core::formats::ImageFormat;

/// One recognized image file found in an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedFile {
    pub filename: String,
    /// Root-relative path, `/`-separated.
    pub rel_path: String,
    pub format: ImageFormat,
}

/// List the recognized image files directly inside `dir`, sorted by name.
///
/// The scan is non-recursive. Subdirectories, unrecognized extensions,
/// non-UTF-8 names and entries that cannot be inspected are skipped; only a
/// failure to read the directory itself is an error.
pub async fn scan_output_dir(dir: &Path, rel_dir: &str) -> io::Result<Vec<HarvestedFile>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        let Some(format) = ImageFormat::from_path(&path) else {
            continue;
        };
        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!(path = %path.display(), "Skipping non UTF-8 file name");
            continue;
        };

        // Follows symlinks, so a link to a regular file is harvested.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                continue;
            }
        }

        files.push(HarvestedFile {
            rel_path: format!("{rel_dir}/{filename}"),
            filename,
            format,
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
}
