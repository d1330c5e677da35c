//! Pipeline settings with serde defaults and validation.

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};
use crate::model::Category;

/// What to do when a single produced file's content type cannot be detected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionPolicy {
    /// Tag the file with the configured fallback content type.
    #[default]
    Fallback,
    /// Fail the run with a detection error.
    Strict,
}

/// Tunables for the execution pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    /// Content type used when detection finds nothing and the policy allows it.
    pub fallback_content_type: String,
    /// Detection failure policy.
    pub detection: DetectionPolicy,
    /// Suggested download name for multi-file archives.
    pub archive_name: String,
    /// Default input name for image templates.
    pub image_input_name: String,
    /// Default input name for every other template.
    pub video_input_name: String,
    /// Engine filesystem path listed for snapshots.
    pub listing_path: String,
    /// Capacity of the event bus replay ring.
    pub event_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            fallback_content_type: "application/octet-stream".to_string(),
            detection: DetectionPolicy::Fallback,
            archive_name: "output.zip".to_string(),
            image_input_name: "image.png".to_string(),
            video_input_name: "input.mp4".to_string(),
            listing_path: ".".to_string(),
            event_capacity: 256,
        }
    }
}

impl PipelineSettings {
    /// Parse settings from JSON, applying defaults for missing fields, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is malformed or a field is invalid.
    pub fn from_json(raw: &str) -> SettingsResult<Self> {
        let settings: Self =
            serde_json::from_str(raw).map_err(|source| SettingsError::Parse { source })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check field-level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidField`] naming the first offending field.
    pub fn validate(&self) -> SettingsResult<()> {
        if !is_mime(&self.fallback_content_type) {
            return Err(SettingsError::invalid(
                "fallback_content_type",
                "must be a type/subtype MIME string",
                &self.fallback_content_type,
            ));
        }
        for (field, value) in [
            ("archive_name", &self.archive_name),
            ("image_input_name", &self.image_input_name),
            ("video_input_name", &self.video_input_name),
        ] {
            if value.trim().is_empty() {
                return Err(SettingsError::invalid(field, "must not be empty", value));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(SettingsError::invalid(
                    field,
                    "must be a bare file name",
                    value,
                ));
            }
        }
        if self.listing_path.trim().is_empty() {
            return Err(SettingsError::invalid(
                "listing_path",
                "must not be empty",
                &self.listing_path,
            ));
        }
        if self.event_capacity == 0 {
            return Err(SettingsError::InvalidField {
                field: "event_capacity",
                reason: "must be greater than zero",
                value: Some("0".to_string()),
            });
        }
        Ok(())
    }

    /// Default input file name for a template category.
    #[must_use]
    pub fn default_input_name(&self, category: Category) -> &str {
        match category {
            Category::Image => &self.image_input_name,
            Category::Video | Category::Uncategorized => &self.video_input_name,
        }
    }
}

fn is_mime(value: &str) -> bool {
    value.split_once('/').is_some_and(|(kind, subtype)| {
        !kind.is_empty() && !subtype.is_empty() && !value.contains(char::is_whitespace)
    })
}
