//! Error types for engine and archive collaborators.
//!
//! # Design
//! - Keep messages constant; operation and target context live in fields.
//! - Preserve engine-native failures as boxed sources so callers can render the chain.

use std::error::Error;

use thiserror::Error;

/// Boxed source error carried by collaborator failures.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Errors raised by a media engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine runtime has not been loaded yet.
    #[error("engine runtime not loaded")]
    NotLoaded {
        /// Operation that was attempted.
        operation: &'static str,
    },
    /// A file was not present in the engine filesystem.
    #[error("engine file not found")]
    NotFound {
        /// Name that failed lookup.
        name: String,
    },
    /// A file name cannot be mapped onto the engine filesystem.
    #[error("invalid engine file name")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// The engine command ran but reported failure.
    #[error("engine command failed")]
    CommandFailed {
        /// Exit status reported by the engine, when it has one.
        exit_code: Option<i32>,
        /// Engine-provided failure detail.
        #[source]
        source: BoxError,
    },
    /// An engine operation failed before or while running.
    #[error("engine operation failed")]
    OperationFailed {
        /// Operation identifier.
        operation: &'static str,
        /// File or path the operation targeted.
        target: Option<String>,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// The engine does not implement the requested capability.
    #[error("engine operation not supported")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
}

impl EngineError {
    /// Wrap an engine-native failure for the given operation.
    pub fn operation_failed(
        operation: &'static str,
        target: Option<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::OperationFailed {
            operation,
            target,
            source: source.into(),
        }
    }

    /// Build a command failure from an exit code and engine detail text.
    pub fn command_failed(exit_code: Option<i32>, detail: impl Into<String>) -> Self {
        let detail: String = detail.into();
        Self::CommandFailed {
            exit_code,
            source: detail.into(),
        }
    }

    /// Returns `true` when the failure means the file is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while synthesising an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An entry could not be appended to the archive.
    #[error("archive entry could not be added")]
    Entry {
        /// Entry name.
        name: String,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// The archive could not be finalised into bytes.
    #[error("archive could not be serialized")]
    Serialize {
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

/// Convenience alias for archive results.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
