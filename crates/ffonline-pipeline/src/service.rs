//! Execution pipeline: stage inputs, run the engine, reconcile, package.
//!
//! # Design
//! - One run at a time; the engine filesystem is global mutable state, so an
//!   overlapping `execute` is rejected with `Busy` instead of interleaving.
//! - The pre-run snapshot is taken before staging and the post-run snapshot
//!   after the engine returns, both through the same listing call.
//! - Progress and phase changes go to the event bus; the returned future only
//!   carries the terminal outcome.
//! - Failures leave the engine filesystem as-is; the next run overwrites it.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ffonline_config::PipelineSettings;
use ffonline_core::{MediaEngine, ProgressSink};
use ffonline_events::{Event, RunPhase};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assembler::ExecutionRequest;
use crate::error::{PipelineError, PipelineResult, describe_error};
use crate::gate::EngineGate;
use crate::model::{RunOutcome, RunState, StagedFile};
use crate::packager::OutputPackager;
use crate::snapshot::Snapshot;

/// Orchestrates a single conversion run against the shared engine.
pub struct ExecutionPipeline {
    gate: EngineGate,
    packager: OutputPackager,
    settings: Arc<PipelineSettings>,
    state: Mutex<RunState>,
}

impl ExecutionPipeline {
    /// Build a pipeline over `gate`'s engine.
    #[must_use]
    pub const fn new(
        gate: EngineGate,
        packager: OutputPackager,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        Self {
            gate,
            packager,
            settings,
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.lock_state()
    }

    /// Engine gate the pipeline runs behind.
    #[must_use]
    pub const fn gate(&self) -> &EngineGate {
        &self.gate
    }

    /// Run `request` over `files`.
    ///
    /// With no files this is a no-op returning [`RunOutcome::NoInput`] and the
    /// state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EngineNotReady`] before the engine has loaded,
    /// [`PipelineError::Busy`] while another run is active, and the staging,
    /// execution, reconciliation, or packaging failure that ended the run.
    pub async fn execute(
        &self,
        files: &[StagedFile],
        request: &ExecutionRequest,
    ) -> PipelineResult<RunOutcome> {
        if files.is_empty() {
            debug!("execute called without staged files; staying idle");
            return Ok(RunOutcome::NoInput);
        }
        self.gate.ensure_ready()?;
        let mut run = self.claim()?;

        let run_id = Uuid::new_v4();
        let command = request.command_line();
        info!(run_id = %run_id, inputs = files.len(), command = %command, "run started");
        self.publish_event(Event::RunStarted {
            run_id,
            command,
            inputs: files.iter().map(|file| file.name.clone()).collect(),
        });

        match self.drive(&mut run, run_id, files, request).await {
            Ok(outcome) => {
                run.settle(RunState::Done);
                let (produced, download) = match &outcome {
                    RunOutcome::Produced { files, bundle } => (
                        files.iter().cloned().collect(),
                        Some(bundle.suggested_filename.clone()),
                    ),
                    RunOutcome::NoInput | RunOutcome::NothingProduced => (Vec::new(), None),
                };
                info!(
                    run_id = %run_id,
                    produced = produced.len(),
                    download = download.as_deref().unwrap_or("-"),
                    "run completed"
                );
                self.publish_event(Event::RunCompleted {
                    run_id,
                    produced,
                    download,
                });
                Ok(outcome)
            }
            Err(err) => {
                run.settle(RunState::Failed);
                let message = describe_error(&err);
                warn!(run_id = %run_id, error = %message, "run failed");
                self.publish_event(Event::RunFailed { run_id, message });
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        run: &mut ActiveRun<'_>,
        run_id: Uuid,
        files: &[StagedFile],
        request: &ExecutionRequest,
    ) -> PipelineResult<RunOutcome> {
        let engine = self.gate.engine().as_ref();
        let listing_path = self.settings.listing_path.as_str();

        self.enter_phase(run, run_id, RunPhase::Staging);
        let pre = Snapshot::capture(engine, listing_path).await?;
        let staged = stage_inputs(engine, run_id, files).await?;

        self.enter_phase(run, run_id, RunPhase::Running);
        let sink = self.progress_sink(run_id);
        engine
            .run(&request.args(), &sink)
            .await
            .map_err(|source| PipelineError::Execution { source })?;

        self.enter_phase(run, run_id, RunPhase::Reconciling);
        let post = Snapshot::capture(engine, listing_path).await?;
        let mut produced = Snapshot::diff(&pre, &post);
        produced.retain(|name| !staged.contains(name));
        debug!(run_id = %run_id, produced = produced.len(), "engine filesystem reconciled");
        if produced.is_empty() {
            return Ok(RunOutcome::NothingProduced);
        }

        self.enter_phase(run, run_id, RunPhase::Packaging);
        let bundle = self.packager.package(engine, &produced).await?;
        Ok(match bundle {
            Some(bundle) => RunOutcome::Produced {
                files: produced,
                bundle,
            },
            None => RunOutcome::NothingProduced,
        })
    }

    fn claim(&self) -> PipelineResult<ActiveRun<'_>> {
        let mut state = self.lock_state();
        if state.is_active() {
            return Err(PipelineError::Busy {
                state: state.as_str(),
            });
        }
        *state = RunState::Staging;
        drop(state);
        Ok(ActiveRun {
            state: &self.state,
            settled: false,
        })
    }

    fn enter_phase(&self, run: &mut ActiveRun<'_>, run_id: Uuid, phase: RunPhase) {
        let state = match phase {
            RunPhase::Staging => RunState::Staging,
            RunPhase::Running => RunState::Running,
            RunPhase::Reconciling | RunPhase::Packaging => RunState::Reconciling,
        };
        run.set(state);
        debug!(run_id = %run_id, phase = phase.as_str(), "run phase entered");
        self.publish_event(Event::PhaseChanged { run_id, phase });
    }

    fn progress_sink(&self, run_id: Uuid) -> ProgressSink {
        let events = self.gate.events().clone();
        let tracker = ProgressTracker::default();
        ProgressSink::new(move |ratio| {
            if let Some(ratio) = tracker.advance(ratio) {
                let _ = events.publish(Event::Progress { run_id, ratio });
            }
        })
    }

    fn publish_event(&self, event: Event) {
        let _ = self.gate.events().publish(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn stage_inputs(
    engine: &dyn MediaEngine,
    run_id: Uuid,
    files: &[StagedFile],
) -> PipelineResult<BTreeSet<String>> {
    let mut staged = BTreeSet::new();
    for file in files {
        if !staged.insert(file.name.clone()) {
            warn!(
                run_id = %run_id,
                file = %file.name,
                "input staged twice in one run; last write wins"
            );
        }
        engine
            .write_file(&file.name, &file.bytes)
            .await
            .map_err(|source| PipelineError::Staging {
                file: file.name.clone(),
                source,
            })?;
        debug!(run_id = %run_id, file = %file.name, size = file.bytes.len(), "input staged");
    }
    Ok(staged)
}

/// Claim on the run state; a run dropped before settling is recorded as failed.
struct ActiveRun<'a> {
    state: &'a Mutex<RunState>,
    settled: bool,
}

impl ActiveRun<'_> {
    fn set(&mut self, next: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn settle(&mut self, terminal: RunState) {
        self.set(terminal);
        self.settled = true;
    }
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.set(RunState::Failed);
        }
    }
}

/// Clamps ratios into `0.0..=1.0` and drops any that would move backwards.
#[derive(Default)]
struct ProgressTracker {
    last: Mutex<Option<f64>>,
}

impl ProgressTracker {
    fn advance(&self, ratio: f64) -> Option<f64> {
        let ratio = ratio.clamp(0.0, 1.0);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.is_some_and(|previous| ratio < previous) {
            return None;
        }
        *last = Some(ratio);
        Some(ratio)
    }
}
