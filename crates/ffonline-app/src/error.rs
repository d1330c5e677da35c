//! # Design
//!
//! - Centralize session and bootstrap errors.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::path::PathBuf;

use ffonline_config::{CatalogError, SettingsError};
use ffonline_core::EngineError;
use ffonline_pipeline::PipelineError;
use ffonline_telemetry::TelemetryError;
use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Pipeline settings were unreadable or invalid.
    #[error("settings operation failed")]
    Settings {
        /// Operation identifier.
        operation: &'static str,
        /// Source settings error.
        source: SettingsError,
    },
    /// The template catalog could not be loaded.
    #[error("catalog operation failed")]
    Catalog {
        /// Operation identifier.
        operation: &'static str,
        /// Source catalog error.
        source: CatalogError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: TelemetryError,
    },
    /// The media engine could not be constructed.
    #[error("engine operation failed")]
    Engine {
        /// Operation identifier.
        operation: &'static str,
        /// Source engine error.
        source: EngineError,
    },
    /// A pipeline operation was rejected or failed.
    #[error("pipeline operation failed")]
    Pipeline {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: PipelineError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Optional path involved in the failure.
        path: Option<PathBuf>,
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn settings(operation: &'static str, source: SettingsError) -> Self {
        Self::Settings { operation, source }
    }

    pub(crate) const fn catalog(operation: &'static str, source: CatalogError) -> Self {
        Self::Catalog { operation, source }
    }

    pub(crate) const fn telemetry(operation: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn engine(operation: &'static str, source: EngineError) -> Self {
        Self::Engine { operation, source }
    }

    pub(crate) const fn pipeline(operation: &'static str, source: PipelineError) -> Self {
        Self::Pipeline { operation, source }
    }

    /// Pipeline failure carried by this error, if any.
    #[must_use]
    pub const fn pipeline_error(&self) -> Option<&PipelineError> {
        match self {
            Self::Pipeline { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_helpers_build_variants() {
        let settings = AppError::settings(
            "settings.validate",
            SettingsError::InvalidField {
                field: "archive_name",
                reason: "empty",
                value: None,
            },
        );
        assert!(matches!(settings, AppError::Settings { .. }));

        let catalog = AppError::catalog("catalog.load", CatalogError::MissingDefault);
        assert!(matches!(catalog, AppError::Catalog { .. }));

        let engine = AppError::engine(
            "engine.new",
            EngineError::Unsupported {
                operation: "list_directory",
            },
        );
        assert!(matches!(engine, AppError::Engine { .. }));
        assert!(engine.pipeline_error().is_none());

        let pipeline = AppError::pipeline(
            "workbench.run",
            PipelineError::Busy { state: "running" },
        );
        assert!(matches!(
            pipeline.pipeline_error(),
            Some(PipelineError::Busy { state: "running" })
        ));
    }
}
