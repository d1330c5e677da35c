//! Presentation-facing session over one engine.
//!
//! # Design
//! - Every method takes `&self` so a renderer can poll [`Workbench::status`]
//!   while a run is in flight; locks are never held across an await.
//! - A fetch releases the handles it supersedes before it starts; a run
//!   releases them once the pipeline has accepted it.
//! - Pipeline rejections and failures become status text as well as errors.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ffonline_config::{PipelineSettings, TemplateCatalog, TemplateGroup};
use ffonline_core::MediaEngine;
use ffonline_events::{EventBus, EventStream};
use ffonline_pipeline::{
    CommandDraft, EngineGate, EngineState, ExecutionPipeline, ExecutionRequest, FetchResult,
    FetchedFile, ManualFetch, OutputBundle, OutputPackager, PipelineError, Resource,
    ResourceHandle, ResourceRegistry, RunOutcome, RunState, StagedFile, describe_error,
};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::status::{Status, StatusBoard};

/// What a [`Workbench::run`] call amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// No files were staged; nothing ran.
    NoInput,
    /// The command succeeded without creating files.
    NothingProduced,
    /// New files were created and bundled for download.
    Produced {
        /// Produced file names.
        files: BTreeSet<String>,
        /// Download bundle, live until the next run.
        bundle: OutputBundle,
    },
}

#[derive(Default)]
struct Held {
    bundle: Option<OutputBundle>,
    fetched: Vec<FetchedFile>,
}

struct StatusFeed {
    stream: EventStream,
    board: StatusBoard,
}

impl StatusFeed {
    fn drain(&mut self) {
        while let Some(envelope) = self.stream.try_next() {
            self.board.apply(&envelope.event);
        }
    }
}

/// Template selection, staged inputs, and downloadable results for one user.
pub struct Workbench {
    catalog: Arc<TemplateCatalog>,
    settings: Arc<PipelineSettings>,
    gate: EngineGate,
    pipeline: ExecutionPipeline,
    fetcher: ManualFetch,
    resources: ResourceRegistry,
    draft: Mutex<CommandDraft>,
    staged: Mutex<Vec<StagedFile>>,
    held: Mutex<Held>,
    status: Mutex<StatusFeed>,
}

impl Workbench {
    /// Wire a session around `engine`. The engine is not loaded yet; call
    /// [`Workbench::initialise`].
    #[must_use]
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        catalog: TemplateCatalog,
        settings: PipelineSettings,
    ) -> Self {
        let settings = Arc::new(settings);
        let events = EventBus::with_capacity(settings.event_capacity);
        let resources = ResourceRegistry::new();
        let gate = EngineGate::new(engine, events.clone());
        let packager = OutputPackager::new(Arc::clone(&settings), resources.clone());
        let pipeline = ExecutionPipeline::new(gate.clone(), packager.clone(), Arc::clone(&settings));
        let fetcher = ManualFetch::new(gate.clone(), packager);
        let draft = CommandDraft::new(catalog.default_template(), &settings);

        Self {
            catalog: Arc::new(catalog),
            settings,
            status: Mutex::new(StatusFeed {
                stream: events.subscribe(None),
                board: StatusBoard::default(),
            }),
            gate,
            pipeline,
            fetcher,
            resources,
            draft: Mutex::new(draft),
            staged: Mutex::new(Vec::new()),
            held: Mutex::new(Held::default()),
        }
    }

    /// Load the engine. Safe to call again after a failure to retry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Pipeline`] when the engine fails to load.
    pub async fn initialise(&self) -> AppResult<()> {
        self.gate
            .load()
            .await
            .map_err(|err| AppError::pipeline("workbench.initialise", err))
    }

    /// Engine readiness.
    #[must_use]
    pub fn engine_state(&self) -> EngineState {
        self.gate.state()
    }

    /// Pipeline run state.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.pipeline.state()
    }

    /// Templates grouped for a selection menu.
    #[must_use]
    pub fn templates(&self) -> Vec<TemplateGroup<'_>> {
        self.catalog.grouped()
    }

    /// Select a template by key; unknown keys select the default template.
    /// Returns the key that ended up selected.
    pub fn select_template(&self, key: &str) -> String {
        let template = self.catalog.get_or_default(key);
        let mut draft = self.lock_draft();
        draft.select(template, &self.settings);
        debug!(template = %template.key, "template selected");
        template.key.clone()
    }

    /// Key of the active template.
    #[must_use]
    pub fn selected_key(&self) -> String {
        self.lock_draft().template().key.clone()
    }

    /// Replace the option string of the active template.
    pub fn edit_output_options(&self, options: impl Into<String>) {
        self.lock_draft().edit_output_options(options);
    }

    /// Replace the output file name.
    pub fn edit_output_filename(&self, filename: impl Into<String>) {
        self.lock_draft().edit_output_filename(filename);
    }

    /// Option string currently in effect.
    #[must_use]
    pub fn output_options(&self) -> String {
        self.lock_draft().output_options().to_string()
    }

    /// Add files to the staged list. The input file name follows the last
    /// file added.
    pub fn add_files(&self, files: impl IntoIterator<Item = StagedFile>) {
        let mut staged = self.lock_staged();
        let before = staged.len();
        staged.extend(files);
        if let Some(last) = staged[before..].last() {
            self.lock_draft().set_input_filename(last.name.clone());
        }
        debug!(added = staged.len() - before, total = staged.len(), "files staged");
    }

    /// Drop every staged file.
    pub fn clear_files(&self) {
        self.lock_staged().clear();
    }

    /// Names of the staged files, in insertion order.
    #[must_use]
    pub fn staged_names(&self) -> Vec<String> {
        self.lock_staged().iter().map(|file| file.name.clone()).collect()
    }

    /// Request the next run would execute.
    #[must_use]
    pub fn request(&self) -> ExecutionRequest {
        self.lock_draft().request()
    }

    /// Display form of the next command.
    #[must_use]
    pub fn command_preview(&self) -> String {
        self.request().command_line()
    }

    /// Warning attached to the active template.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        self.lock_draft().template().warning.clone()
    }

    /// Run the active command over the staged files.
    ///
    /// Without staged files this does nothing and reports
    /// [`RunReport::NoInput`]. Once the pipeline accepts the run, the previous
    /// bundle and fetch results are released; a rejected run keeps them.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Pipeline`] when the run is rejected or fails; the
    /// status line carries the same failure.
    pub async fn run(&self) -> AppResult<RunReport> {
        let files = self.lock_staged().clone();
        if files.is_empty() {
            return Ok(RunReport::NoInput);
        }
        let request = self.request();

        let outcome = self.pipeline.execute(&files, &request).await;
        if !matches!(
            outcome,
            Err(PipelineError::Busy { .. } | PipelineError::EngineNotReady { .. })
        ) {
            self.release_held();
        }
        match outcome {
            Ok(RunOutcome::NoInput) => Ok(RunReport::NoInput),
            Ok(RunOutcome::NothingProduced) => Ok(RunReport::NothingProduced),
            Ok(RunOutcome::Produced { files, bundle }) => {
                self.lock_held().bundle = Some(bundle.clone());
                Ok(RunReport::Produced { files, bundle })
            }
            Err(err) => {
                self.note_failure(&describe_error(&err));
                Err(AppError::pipeline("workbench.run", err))
            }
        }
    }

    /// Fetch named files from the engine filesystem, replacing the previous
    /// fetch results.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Pipeline`] when the engine is not ready. Per-file
    /// failures are reported inside the results.
    pub async fn fetch(&self, raw: &str) -> AppResult<Vec<FetchResult>> {
        let previous = std::mem::take(&mut self.lock_held().fetched);
        self.release(previous.iter().map(|file| &file.handle));

        let results = self.fetcher.fetch_many(raw).await.map_err(|err| {
            self.note_failure(&describe_error(&err));
            AppError::pipeline("workbench.fetch", err)
        })?;
        let fetched: Vec<FetchedFile> = results
            .iter()
            .filter_map(|result| result.outcome.as_ref().ok().cloned())
            .collect();
        self.lock_held().fetched = fetched;
        Ok(results)
    }

    /// Bundle from the last successful run.
    #[must_use]
    pub fn bundle(&self) -> Option<OutputBundle> {
        self.lock_held().bundle.clone()
    }

    /// Files from the last fetch.
    #[must_use]
    pub fn fetched(&self) -> Vec<FetchedFile> {
        self.lock_held().fetched.clone()
    }

    /// Resolve a handle to its downloadable bytes.
    #[must_use]
    pub fn resource(&self, handle: &ResourceHandle) -> Option<Resource> {
        self.resources.get(handle)
    }

    /// Number of handles not yet released.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.resources.live_handles()
    }

    /// Current status line.
    #[must_use]
    pub fn status(&self) -> Status {
        let mut feed = self.lock_status();
        feed.drain();
        feed.board.current().clone()
    }

    /// Live event stream for progress and terminal outcomes.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        self.gate.events().subscribe(None)
    }

    fn release_held(&self) {
        let held = std::mem::take(&mut *self.lock_held());
        let handles = held
            .bundle
            .iter()
            .map(|bundle| &bundle.handle)
            .chain(held.fetched.iter().map(|file| &file.handle));
        self.release(handles);
    }

    fn release<'a>(&self, handles: impl Iterator<Item = &'a ResourceHandle>) {
        let released = handles
            .filter(|handle| self.resources.release(handle))
            .count();
        if released > 0 {
            info!(released, "superseded resources released");
        }
    }

    fn note_failure(&self, message: &str) {
        let mut feed = self.lock_status();
        feed.drain();
        feed.board.fail(message);
    }

    fn lock_draft(&self) -> MutexGuard<'_, CommandDraft> {
        self.draft.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_staged(&self) -> MutexGuard<'_, Vec<StagedFile>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_held(&self) -> MutexGuard<'_, Held> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_status(&self) -> MutexGuard<'_, StatusFeed> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
