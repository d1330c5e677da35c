//! Media engine capability surface.
//!
//! The pipeline only talks to the engine through [`MediaEngine`]; any backend
//! (a WebAssembly build, a native executable, a test double) plugs in here.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngineResult;

/// Capability set exposed by a media-processing engine with a private filesystem.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Load the engine runtime. Must complete before any other operation.
    async fn load(&self) -> EngineResult<()>;

    /// Run a single command to completion, reporting fractional progress.
    async fn run(&self, args: &[String], progress: &ProgressSink) -> EngineResult<()>;

    /// Write bytes into the engine filesystem, replacing any existing file.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()>;

    /// Read a file from the engine filesystem.
    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>>;

    /// List entry names under `path` in the engine filesystem.
    async fn list_directory(&self, path: &str) -> EngineResult<Vec<String>>;
}

#[async_trait]
impl<T> MediaEngine for Arc<T>
where
    T: MediaEngine + ?Sized,
{
    async fn load(&self) -> EngineResult<()> {
        (**self).load().await
    }

    async fn run(&self, args: &[String], progress: &ProgressSink) -> EngineResult<()> {
        (**self).run(args, progress).await
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> EngineResult<()> {
        (**self).write_file(name, bytes).await
    }

    async fn read_file(&self, name: &str) -> EngineResult<Vec<u8>> {
        (**self).read_file(name).await
    }

    async fn list_directory(&self, path: &str) -> EngineResult<Vec<String>> {
        (**self).list_directory(path).await
    }
}

/// Callback handle the engine uses to report progress ratios in `0.0..=1.0`.
///
/// Reporting never blocks; the receiving side decides how to surface the value.
#[derive(Clone)]
pub struct ProgressSink {
    callback: Arc<dyn Fn(f64) + Send + Sync>,
}

impl ProgressSink {
    /// Wrap a callback invoked for every reported ratio.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// A sink that discards every report.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Report a progress ratio. Non-finite values are dropped.
    pub fn report(&self, ratio: f64) {
        if ratio.is_finite() {
            (self.callback)(ratio);
        }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ProgressSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn progress_sink_forwards_finite_ratios() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            ProgressSink::new(move |ratio| {
                seen.lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(ratio);
            })
        };

        sink.report(0.25);
        sink.report(f64::NAN);
        sink.report(f64::INFINITY);
        sink.report(1.0);

        let seen = seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(*seen, vec![0.25, 1.0]);
    }

    #[test]
    fn noop_sink_accepts_reports() {
        let sink = ProgressSink::noop();
        sink.report(0.5);
        assert!(format!("{sink:?}").contains("ProgressSink"));
    }
}
