//! Run inputs, states, and outcomes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::resources::ResourceHandle;

/// User-supplied input written into the engine filesystem before a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Name the bytes are written under.
    pub name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl StagedFile {
    /// Construct a staged file.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Execution pipeline state machine.
///
/// `Idle -> Staging -> Running -> Reconciling -> {Done, Failed}`; terminal
/// states accept a new run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run has happened yet.
    #[default]
    Idle,
    /// Inputs are being written.
    Staging,
    /// The engine is executing.
    Running,
    /// Outputs are being discovered and packaged.
    Reconciling,
    /// The last run succeeded.
    Done,
    /// The last run failed.
    Failed,
}

impl RunState {
    /// Machine-friendly label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Staging => "staging",
            Self::Running => "running",
            Self::Reconciling => "reconciling",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether a run currently owns the engine.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Staging | Self::Running | Self::Reconciling)
    }
}

/// Shape of a bundle's payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BundleKind {
    /// One produced file, served as-is.
    Single,
    /// Several produced files bundled into an archive.
    Archive {
        /// Number of archive members.
        entries: usize,
    },
}

/// Downloadable result of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputBundle {
    /// Handle of the published resource.
    pub handle: ResourceHandle,
    /// Name proposed for the download.
    pub suggested_filename: String,
    /// Content type the resource is tagged with.
    pub content_type: String,
    /// Payload size in bytes.
    pub size: usize,
    /// Single file or archive.
    pub kind: BundleKind,
}

/// Terminal result of [`crate::ExecutionPipeline::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No inputs were staged; nothing happened.
    NoInput,
    /// The engine succeeded but no new file appeared.
    NothingProduced,
    /// New files appeared and were packaged.
    Produced {
        /// Produced file names.
        files: BTreeSet<String>,
        /// Downloadable bundle.
        bundle: OutputBundle,
    },
}

impl RunOutcome {
    /// Bundle carried by the outcome, if any.
    #[must_use]
    pub const fn bundle(&self) -> Option<&OutputBundle> {
        match self {
            Self::Produced { bundle, .. } => Some(bundle),
            Self::NoInput | Self::NothingProduced => None,
        }
    }
}
