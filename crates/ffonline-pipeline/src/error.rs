//! Error types for the execution pipeline and manual fetch path.

use std::error::Error;

use ffonline_core::{ArchiveError, EngineError};
use thiserror::Error;

/// Errors raised by pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The engine runtime failed to load.
    #[error("engine failed to initialise")]
    Initialization {
        /// Engine failure.
        #[source]
        source: EngineError,
    },
    /// An operation was attempted before the engine finished loading.
    #[error("engine is not ready")]
    EngineNotReady {
        /// Gate state at the time of the attempt.
        state: &'static str,
    },
    /// A run was requested while another one was active.
    #[error("a run is already in progress")]
    Busy {
        /// State of the active run.
        state: &'static str,
    },
    /// The engine filesystem could not be listed.
    #[error("failed to list engine filesystem")]
    Snapshot {
        /// Listed path.
        path: String,
        /// Engine failure.
        #[source]
        source: EngineError,
    },
    /// An input could not be written into the engine filesystem.
    #[error("failed to stage input file")]
    Staging {
        /// Input file name.
        file: String,
        /// Engine failure.
        #[source]
        source: EngineError,
    },
    /// The engine invocation failed.
    #[error("engine execution failed")]
    Execution {
        /// Engine failure.
        #[source]
        source: EngineError,
    },
    /// A produced file could not be read back.
    #[error("failed to read produced file")]
    ReadProduced {
        /// Produced file name.
        file: String,
        /// Engine failure.
        #[source]
        source: EngineError,
    },
    /// The single produced file's content type could not be detected.
    #[error("content type of produced file could not be detected")]
    Detection {
        /// Produced file name.
        file: String,
    },
    /// The output archive could not be built.
    #[error("failed to build output archive")]
    Archive {
        /// Archive failure.
        #[source]
        source: ArchiveError,
    },
    /// A blocking helper task panicked or was cancelled.
    #[error("background task failed")]
    Task {
        /// Operation the task was performing.
        operation: &'static str,
        /// Join failure.
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Per-file failure of a manual fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The name is not present in the engine filesystem.
    #[error("file not found in engine filesystem")]
    NotFound {
        /// Requested name.
        name: String,
    },
    /// The file exists but could not be read.
    #[error("file could not be read from engine filesystem")]
    Unreadable {
        /// Requested name.
        name: String,
        /// Engine failure.
        #[source]
        source: EngineError,
    },
    /// The file's content type could not be detected under strict detection.
    #[error("content type could not be detected")]
    Detection {
        /// Requested name.
        name: String,
    },
}

impl FetchError {
    /// Name of the file the failure refers to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { name } | Self::Unreadable { name, .. } | Self::Detection { name } => {
                name
            }
        }
    }
}

/// Render an error and its source chain as a single line.
#[must_use]
pub fn describe_error(error: &(dyn Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_error_renders_source_chain() {
        let err = PipelineError::Execution {
            source: EngineError::command_failed(Some(1), "Unrecognized option 'crf'"),
        };
        assert_eq!(
            describe_error(&err),
            "engine execution failed: engine command failed: Unrecognized option 'crf'"
        );
    }

    #[test]
    fn fetch_error_exposes_name() {
        let err = FetchError::NotFound {
            name: "missing.txt".into(),
        };
        assert_eq!(err.name(), "missing.txt");
        assert_eq!(describe_error(&err), "file not found in engine filesystem");
    }
}
