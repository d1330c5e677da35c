//! User-visible status text folded from pipeline events.

use ffonline_events::{Event, RunPhase};

/// Shown before anything has happened.
pub const IDLE: &str = "Select a template and add input files";
/// Engine runtime is loading.
pub const ENGINE_LOADING: &str = "Loading ffmpeg engine...";
/// Engine runtime finished loading.
pub const ENGINE_READY: &str = "Engine ready";
/// Inputs are being written into the engine filesystem.
pub const STAGING: &str = "Writing input files into the engine";
/// The engine command is starting.
pub const STARTING: &str = "Starting command execution";
/// Produced files are being collected.
pub const RECONCILING: &str = "Collecting output files";
/// Produced files are being bundled.
pub const PACKAGING: &str = "Packaging output files";
/// Run finished with something to download.
pub const DONE_WITH_DOWNLOAD: &str =
    "Run succeeded, use the download button to save the output";
/// Run finished without new files.
pub const DONE_NOTHING_PRODUCED: &str =
    "Run succeeded, no files were created; check the engine log for its output";
/// Hint appended to run failures.
pub const FAILURE_HINT: &str = "check the command or the engine log for details";

/// Severity of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Neutral progress information.
    Info,
    /// A finished operation.
    Success,
    /// A failed operation.
    Error,
}

/// Current status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Severity.
    pub level: StatusLevel,
    /// Display text.
    pub text: String,
    /// `true` while the engine is loading or a run is in flight.
    pub busy: bool,
}

impl Status {
    fn info(text: impl Into<String>, busy: bool) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
            busy,
        }
    }

    fn success(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Success,
            text: text.into(),
            busy: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
            busy: false,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::info(IDLE, false)
    }
}

/// Render a progress ratio as a percentage with one decimal, e.g. `42.5%`.
#[must_use]
pub fn format_progress(ratio: f64) -> String {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    format!("{:.1}%", ratio * 100.0)
}

/// Folds events into the status line a presentation layer shows.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    current: Status,
}

impl StatusBoard {
    /// Current status.
    #[must_use]
    pub const fn current(&self) -> &Status {
        &self.current
    }

    /// Update the status from `event`.
    pub fn apply(&mut self, event: &Event) {
        self.current = match event {
            Event::EngineLoading => Status::info(ENGINE_LOADING, true),
            Event::EngineReady => Status::info(ENGINE_READY, false),
            Event::EngineFailed { message } => {
                Status::error(format!("Engine failed to load: {message}"))
            }
            Event::RunStarted { .. } => Status::info(STAGING, true),
            Event::PhaseChanged { phase, .. } => Status::info(phase_text(*phase), true),
            Event::Progress { ratio, .. } => Status::info(format_progress(*ratio), true),
            Event::RunCompleted { download, .. } => Status::success(if download.is_some() {
                DONE_WITH_DOWNLOAD
            } else {
                DONE_NOTHING_PRODUCED
            }),
            Event::RunFailed { message, .. } => Status::error(run_failure_text(message)),
            Event::FetchCompleted { fetched, failed } => fetch_text(fetched, failed),
        };
    }

    /// Record a failure that produced no event, such as a rejected run.
    pub fn fail(&mut self, message: &str) {
        self.current = Status::error(run_failure_text(message));
    }
}

const fn phase_text(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Staging => STAGING,
        RunPhase::Running => STARTING,
        RunPhase::Reconciling => RECONCILING,
        RunPhase::Packaging => PACKAGING,
    }
}

fn run_failure_text(message: &str) -> String {
    format!("Run failed ({message}); {FAILURE_HINT}")
}

fn fetch_text(fetched: &[String], failed: &[String]) -> Status {
    if failed.is_empty() {
        return Status::success(format!("Fetched {} file(s)", fetched.len()));
    }
    let names: Vec<String> = failed
        .iter()
        .map(|name| format!("{name} could not be fetched"))
        .collect();
    Status::error(names.join("; "))
}
