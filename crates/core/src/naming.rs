//! Slug normalization for brands, projects and work items.
//!
//! Every lookup and uniqueness check goes through [`slugify`], so lookups are
//! case- and punctuation-insensitive by construction.

use crate::error::CoreError;

/// Generate a URL-safe slug from a display name.
///
/// Lowercases ASCII letters, replaces every run of non-alphanumeric
/// characters with a single hyphen, and trims leading/trailing hyphens.
pub fn slugify(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut prev_hyphen = false;

    for c in input.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.trim_matches('-').to_string()
}

/// Slugify `name`, rejecting names that normalize to nothing.
///
/// `kind` names the entity in the error message (e.g. "brand").
pub fn require_slug(kind: &str, name: &str) -> Result<String, CoreError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(CoreError::Validation(format!("{kind} name is required")));
    }
    Ok(slug)
}
