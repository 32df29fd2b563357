//! Image formats the pipeline recognizes in generator output.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A recognized image container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpg,
    Webp,
    Ico,
}

/// File extensions (lowercase, without the dot) picked up during harvesting.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "ico"];

impl ImageFormat {
    /// Canonical tag stored on run images and accepted as an output format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
            Self::Ico => "ico",
        }
    }

    /// MIME type used when serving the file.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Ico => "image/x-icon",
        }
    }

    /// Parse an extension or format name, case-insensitively.
    ///
    /// `jpeg` is folded into [`ImageFormat::Jpg`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "webp" => Some(Self::Webp),
            "ico" => Some(Self::Ico),
            _ => None,
        }
    }

    /// Detect the format of a file from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
