//! Scripted in-memory engine double.
//!
//! `MemoryEngine` keeps its filesystem in a `BTreeMap`, runs a caller-supplied
//! handler instead of real media processing, and can be told to fail loads,
//! writes, or reads, or to park inside `run` until a test releases it.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ffonline_core::{EngineError, EngineResult, MediaEngine, ProgressSink};
use tokio::sync::Notify;

/// In-memory engine filesystem: file name to bytes.
pub type MemoryFs = BTreeMap<String, Vec<u8>>;

type RunHandler = Arc<dyn Fn(&[String], &mut MemoryFs) -> Result<(), String> + Send + Sync>;

#[derive(Default)]
struct State {
    loaded: bool,
    load_calls: usize,
    files: MemoryFs,
    runs: Vec<Vec<String>>,
    writes: Vec<String>,
}

/// Engine double with an in-memory filesystem.
pub struct MemoryEngine {
    state: Mutex<State>,
    handler: RunHandler,
    progress: Vec<f64>,
    load_failure: Option<String>,
    write_failures: HashSet<String>,
    read_failures: HashSet<String>,
    run_started: Arc<Notify>,
    run_gate: Option<Arc<Notify>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Engine whose runs succeed without producing anything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            handler: Arc::new(|_, _| Ok(())),
            progress: Vec::new(),
            load_failure: None,
            write_failures: HashSet::new(),
            read_failures: HashSet::new(),
            run_started: Arc::new(Notify::new()),
            run_gate: None,
        }
    }

    /// Seed a file into the filesystem.
    #[must_use]
    pub fn with_file(self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.lock().files.insert(name.to_string(), bytes.into());
        self
    }

    /// Replace the run handler.
    #[must_use]
    pub fn on_run<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[String], &mut MemoryFs) -> Result<(), String> + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Run handler that writes the given files on every run.
    #[must_use]
    pub fn producing(self, outputs: Vec<(&str, Vec<u8>)>) -> Self {
        let outputs: Vec<(String, Vec<u8>)> = outputs
            .into_iter()
            .map(|(name, bytes)| (name.to_string(), bytes))
            .collect();
        self.on_run(move |_, files| {
            for (name, bytes) in &outputs {
                files.insert(name.clone(), bytes.clone());
            }
            Ok(())
        })
    }

    /// Run handler that always fails with `message`.
    #[must_use]
    pub fn failing_run(self, message: &str) -> Self {
        let message = message.to_string();
        self.on_run(move |_, _| Err(message.clone()))
    }

    /// Ratios reported through the progress sink during each run.
    #[must_use]
    pub fn with_progress(mut self, ratios: Vec<f64>) -> Self {
        self.progress = ratios;
        self
    }

    /// Make `load` fail with `message`.
    #[must_use]
    pub fn failing_load(mut self, message: &str) -> Self {
        self.load_failure = Some(message.to_string());
        self
    }

    /// Make writes of `name` fail.
    #[must_use]
    pub fn failing_write(mut self, name: &str) -> Self {
        self.write_failures.insert(name.to_string());
        self
    }

    /// Make reads of `name` fail with an I/O style error.
    #[must_use]
    pub fn failing_read(mut self, name: &str) -> Self {
        self.read_failures.insert(name.to_string());
        self
    }

    /// Park every run until `gate` is notified.
    #[must_use]
    pub fn with_run_gate(mut self, gate: Arc<Notify>) -> Self {
        self.run_gate = Some(gate);
        self
    }

    /// Notified each time a run starts.
    #[must_use]
    pub fn run_started(&self) -> Arc<Notify> {
        Arc::clone(&self.run_started)
    }

    /// Copy of the current filesystem.
    #[must_use]
    pub fn files(&self) -> MemoryFs {
        self.lock().files.clone()
    }

    /// Argument lists of every run so far.
    #[must_use]
    pub fn runs(&self) -> Vec<Vec<String>> {
        self.lock().runs.clone()
    }

    /// Names written, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Number of `load` calls observed.
    #[must_use]
    pub fn load_calls(&self) -> usize {
        self.lock().load_calls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_loaded(&self, operation: &'static str) -> EngineResult<()> {
        if self.lock().loaded {
            Ok(())
        } else {
            Err(EngineError::NotLoaded { operation })
        }
    }
}

#[async_trait]
impl MediaEngine for MemoryEngine {
    async fn load(&self) -> EngineResult<()> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.load_calls += 1;
        if let Some(message) = &self.load_failure {
            return Err(EngineError::operation_failed(
                "load",
                None,
                message.clone(),
            ));
        }
        state.loaded = true;
        Ok(())
    }

    async fn run(&self, args: &[String], progress: &ProgressSink) -> EngineResult<()> {
        self.require_loaded("run")?;
        self.lock().runs.push(args.to_vec());
        self.run_started.notify_one();
        if let Some(gate) = &self.run_gate {
            gate.notified().await;
        }

        for ratio in &self.progress {
            progress.report(*ratio);
            tokio::task::yield_now().await;
        }

        let outcome = {
            let mut state = self.lock();
            (self.handler)(args, &mut state.files)
        };
        outcome.map_err(|detail| EngineError::command_failed(Some(1), detail))
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        self.require_loaded("write_file")?;
        if self.write_failures.contains(name) {
            return Err(EngineError::operation_failed(
                "write_file",
                Some(name.to_string()),
                "storage quota exceeded",
            ));
        }
        let mut state = self.lock();
        state.writes.push(name.to_string());
        state.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        self.require_loaded("read_file")?;
        if self.read_failures.contains(name) {
            return Err(EngineError::operation_failed(
                "read_file",
                Some(name.to_string()),
                "read interrupted",
            ));
        }
        self.lock()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                name: name.to_string(),
            })
    }

    async fn list_directory(&self, path: &str) -> EngineResult<Vec<String>> {
        self.require_loaded("list_directory")?;
        if !matches!(path, "." | "/" | "") {
            return Err(EngineError::NotFound {
                name: path.to_string(),
            });
        }
        let state = self.lock();
        let mut names = vec![".".to_string(), "..".to_string()];
        names.extend(state.files.keys().cloned());
        Ok(names)
    }
}
