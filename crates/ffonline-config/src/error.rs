//! Error types for catalog loading and settings validation.

use thiserror::Error;

use crate::model::SegmentRole;

/// Errors raised while loading or validating a template catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Raw catalog document could not be parsed.
    #[error("failed to parse template catalog")]
    Parse {
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// Template key was empty.
    #[error("template key must not be empty")]
    EmptyKey,
    /// Two templates share a key.
    #[error("duplicate template key")]
    DuplicateKey {
        /// Key that appeared more than once.
        key: String,
    },
    /// Template did not carry exactly four segments.
    #[error("template must have exactly four segments")]
    Arity {
        /// Template key.
        key: String,
        /// Number of segments found.
        found: usize,
    },
    /// A segment violated the constraints of its positional role.
    #[error("template segment violates its role")]
    SegmentRole {
        /// Template key.
        key: String,
        /// Role of the offending segment.
        role: SegmentRole,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The catalog has no fallback template.
    #[error("template catalog has no default template")]
    MissingDefault,
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while loading pipeline settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings document could not be parsed.
    #[error("failed to parse pipeline settings")]
    Parse {
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid pipeline setting")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.to_string()),
        }
    }
}

/// Convenience alias for settings results.
pub type SettingsResult<T> = Result<T, SettingsError>;
