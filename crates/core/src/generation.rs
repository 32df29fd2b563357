//! Generation settings carried by a job, and prompt assembly for runs.
//!
//! Settings arrive from the enqueue path as [`GenerationSettingsInput`]
//! (every field optional), are normalized by
//! [`GenerationSettingsInput::normalize`], and are persisted on the job as a
//! [`GenerationSettings`] JSON payload.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::formats::ImageFormat;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Generate with the Google model only.
pub const MODEL_GOOGLE: &str = "google";

/// Generate with the OpenAI model only.
pub const MODEL_OPENAI: &str = "openai";

/// Generate with both models.
pub const MODEL_BOTH: &str = "both";

/// Valid model selectors.
pub const VALID_MODELS: &[&str] = &[MODEL_GOOGLE, MODEL_OPENAI, MODEL_BOTH];

/// Valid image sizes (stored upper-case).
pub const VALID_IMAGE_SIZES: &[&str] = &["1K", "2K", "4K"];

/// Valid aspect ratios. An empty ratio means "generator default".
pub const VALID_ASPECT_RATIOS: &[&str] = &[
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

pub const DEFAULT_MODEL: &str = MODEL_BOTH;
pub const DEFAULT_COUNT: u32 = 1;
pub const DEFAULT_IMAGE_SIZE: &str = "1K";
pub const DEFAULT_OUTPUT_FORMAT: ImageFormat = ImageFormat::Png;

/// Upper bound on images requested per model in one job.
pub const MAX_COUNT: u32 = 10;

/// Separator placed between the base prompt and the adjustment text.
const ADJUSTMENT_HEADER: &str = "\n\nAdjustments:\n";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Normalized settings persisted as a job payload and a run snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub count: u32,
    pub output_format: ImageFormat,
    pub image_size: String,
    /// Empty when the generator should pick its own ratio.
    #[serde(default)]
    pub aspect_ratio: String,
    /// Free-text adjustment appended to the work item prompt.
    #[serde(default)]
    pub adjustment: String,
}

/// Raw settings as submitted on the enqueue path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationSettingsInput {
    pub model: Option<String>,
    pub count: Option<u32>,
    pub output_format: Option<String>,
    pub image_size: Option<String>,
    pub aspect_ratio: Option<String>,
    pub adjustment: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

impl GenerationSettingsInput {
    /// Apply defaults to absent or blank fields and validate the rest.
    ///
    /// Returns [`CoreError::Validation`] for any value outside its allowed
    /// set; nothing should be persisted in that case.
    pub fn normalize(&self) -> Result<GenerationSettings, CoreError> {
        let model = match non_blank(&self.model) {
            Some(m) => validate_model(m)?,
            None => DEFAULT_MODEL.to_string(),
        };

        let count = self.count.unwrap_or(DEFAULT_COUNT);
        validate_count(count)?;

        let output_format = match non_blank(&self.output_format) {
            Some(f) => ImageFormat::from_extension(f).ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid output format '{f}'. Must be one of: png, jpg, webp, ico"
                ))
            })?,
            None => DEFAULT_OUTPUT_FORMAT,
        };

        let image_size = match non_blank(&self.image_size) {
            Some(s) => validate_image_size(s)?,
            None => DEFAULT_IMAGE_SIZE.to_string(),
        };

        let aspect_ratio = match non_blank(&self.aspect_ratio) {
            Some(r) => validate_aspect_ratio(r)?,
            None => String::new(),
        };

        let adjustment = self
            .adjustment
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        Ok(GenerationSettings {
            model,
            count,
            output_format,
            image_size,
            aspect_ratio,
            adjustment,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validate a model selector, returning its lowercase form.
pub fn validate_model(model: &str) -> Result<String, CoreError> {
    let model = model.trim().to_ascii_lowercase();
    if VALID_MODELS.contains(&model.as_str()) {
        Ok(model)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid model '{model}'. Must be one of: {VALID_MODELS:?}"
        )))
    }
}

/// Validate the per-model image count.
pub fn validate_count(count: u32) -> Result<(), CoreError> {
    if (1..=MAX_COUNT).contains(&count) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Count must be between 1 and {MAX_COUNT}, got {count}"
        )))
    }
}

/// Validate an image size, returning its upper-case form.
pub fn validate_image_size(size: &str) -> Result<String, CoreError> {
    let size = size.trim().to_ascii_uppercase();
    if VALID_IMAGE_SIZES.contains(&size.as_str()) {
        Ok(size)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid image size '{size}'. Must be one of: {VALID_IMAGE_SIZES:?}"
        )))
    }
}

/// Validate an aspect ratio.
pub fn validate_aspect_ratio(ratio: &str) -> Result<String, CoreError> {
    let ratio = ratio.trim();
    if VALID_ASPECT_RATIOS.contains(&ratio) {
        Ok(ratio.to_string())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid aspect ratio '{ratio}'. Must be one of: {VALID_ASPECT_RATIOS:?}"
        )))
    }
}

/// Validate a work item prompt, returning it trimmed.
pub fn validate_prompt(prompt: &str) -> Result<String, CoreError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(CoreError::Validation("prompt is required".into()));
    }
    Ok(prompt.to_string())
}

// ---------------------------------------------------------------------------
// Prompt assembly
// ---------------------------------------------------------------------------

/// Build the frozen prompt recorded on a run: the base prompt, followed by
/// the adjustment text under an `Adjustments:` header when one is present.
pub fn build_prompt_snapshot(prompt: &str, adjustment: &str) -> String {
    let prompt = prompt.trim();
    let adjustment = adjustment.trim();
    if adjustment.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}{ADJUSTMENT_HEADER}{adjustment}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_input_gets_defaults() {
        let settings = GenerationSettingsInput::default().normalize().unwrap();
        assert_eq!(settings.model, "both");
        assert_eq!(settings.count, 1);
        assert_eq!(settings.output_format, ImageFormat::Png);
        assert_eq!(settings.image_size, "1K");
        assert_eq!(settings.aspect_ratio, "");
        assert_eq!(settings.adjustment, "");
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let input = GenerationSettingsInput {
            model: Some("  ".into()),
            image_size: Some(String::new()),
            ..Default::default()
        };
        let settings = input.normalize().unwrap();
        assert_eq!(settings.model, "both");
        assert_eq!(settings.image_size, "1K");
    }

    #[test]
    fn values_are_normalized() {
        let input = GenerationSettingsInput {
            model: Some("OpenAI".into()),
            count: Some(3),
            output_format: Some("JPEG".into()),
            image_size: Some("2k".into()),
            aspect_ratio: Some(" 16:9 ".into()),
            adjustment: Some("  warmer colors ".into()),
        };
        let settings = input.normalize().unwrap();
        assert_eq!(settings.model, "openai");
        assert_eq!(settings.count, 3);
        assert_eq!(settings.output_format, ImageFormat::Jpg);
        assert_eq!(settings.image_size, "2K");
        assert_eq!(settings.aspect_ratio, "16:9");
        assert_eq!(settings.adjustment, "warmer colors");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            GenerationSettingsInput {
                model: Some("midjourney".into()),
                ..Default::default()
            },
            GenerationSettingsInput {
                count: Some(0),
                ..Default::default()
            },
            GenerationSettingsInput {
                count: Some(MAX_COUNT + 1),
                ..Default::default()
            },
            GenerationSettingsInput {
                output_format: Some("gif".into()),
                ..Default::default()
            },
            GenerationSettingsInput {
                image_size: Some("8K".into()),
                ..Default::default()
            },
            GenerationSettingsInput {
                aspect_ratio: Some("7:3".into()),
                ..Default::default()
            },
        ];
        for input in cases {
            assert_matches!(input.normalize(), Err(CoreError::Validation(_)), "{input:?}");
        }
    }

    #[test]
    fn settings_round_trip_through_json_payload() {
        let settings = GenerationSettingsInput::default().normalize().unwrap();
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["output_format"], "png");
        let back: GenerationSettings = serde_json::from_value(json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn prompt_snapshot_without_adjustment() {
        assert_eq!(build_prompt_snapshot("  p  ", ""), "p");
        assert_eq!(build_prompt_snapshot("p", "   "), "p");
    }

    #[test]
    fn prompt_snapshot_with_adjustment() {
        assert_eq!(
            build_prompt_snapshot("a red fox", " make it blue "),
            "a red fox\n\nAdjustments:\nmake it blue"
        );
    }

    #[test]
    fn prompt_validation() {
        assert_matches!(validate_prompt("   "), Err(CoreError::Validation(_)));
        assert_eq!(validate_prompt(" icon ").unwrap(), "icon");
    }
}
