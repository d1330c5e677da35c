//! Manual fetch path: retrieve arbitrary named files from the engine filesystem.

use ffonline_core::MediaEngine;
use ffonline_events::Event;
use tracing::{info, warn};

use crate::error::{FetchError, PipelineResult, describe_error};
use crate::gate::EngineGate;
use crate::packager::OutputPackager;
use crate::resources::ResourceHandle;

/// Successfully fetched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Requested name.
    pub name: String,
    /// Handle of the published resource.
    pub handle: ResourceHandle,
    /// Detected (or fallback) content type.
    pub content_type: String,
    /// Payload size in bytes.
    pub size: usize,
}

/// Outcome of one name in a fetch request.
#[derive(Debug)]
pub struct FetchResult {
    /// Requested name.
    pub name: String,
    /// Fetched file or the per-file failure.
    pub outcome: Result<FetchedFile, FetchError>,
}

/// Split a comma-separated fetch list, trimming names and dropping empty entries.
#[must_use]
pub fn parse_fetch_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Looks up names independently; one failure never aborts its siblings.
#[derive(Clone)]
pub struct ManualFetch {
    gate: EngineGate,
    packager: OutputPackager,
}

impl ManualFetch {
    /// Fetch through `gate`'s engine, publishing into `packager`'s registry.
    #[must_use]
    pub const fn new(gate: EngineGate, packager: OutputPackager) -> Self {
        Self { gate, packager }
    }

    /// Fetch every name in the comma-separated `raw` list, in order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PipelineError::EngineNotReady`] before the engine has
    /// loaded. Per-file failures are reported inside the results.
    pub async fn fetch_many(&self, raw: &str) -> PipelineResult<Vec<FetchResult>> {
        self.gate.ensure_ready()?;
        let engine = self.gate.engine();

        let mut results = Vec::new();
        for name in parse_fetch_list(raw) {
            let outcome = self.fetch_one(engine.as_ref(), &name).await;
            if let Err(err) = &outcome {
                warn!(file = %name, error = %describe_error(err), "manual fetch failed");
            }
            results.push(FetchResult { name, outcome });
        }

        let (fetched, failed): (Vec<_>, Vec<_>) = results
            .iter()
            .partition(|result| result.outcome.is_ok());
        let fetched: Vec<String> = fetched.into_iter().map(|result| result.name.clone()).collect();
        let failed: Vec<String> = failed.into_iter().map(|result| result.name.clone()).collect();
        info!(
            fetched = fetched.len(),
            failed = failed.len(),
            "manual fetch finished"
        );
        let _ = self
            .gate
            .events()
            .publish(Event::FetchCompleted { fetched, failed });
        Ok(results)
    }

    async fn fetch_one(
        &self,
        engine: &dyn MediaEngine,
        name: &str,
    ) -> Result<FetchedFile, FetchError> {
        let bytes = engine.read_file(name).await.map_err(|source| {
            if source.is_not_found() {
                FetchError::NotFound {
                    name: name.to_string(),
                }
            } else {
                FetchError::Unreadable {
                    name: name.to_string(),
                    source,
                }
            }
        })?;

        let content_type =
            self.packager
                .classify(name, &bytes)
                .ok_or_else(|| FetchError::Detection {
                    name: name.to_string(),
                })?;
        let size = bytes.len();
        let handle = self.packager.resources().publish(name, &content_type, bytes);
        Ok(FetchedFile {
            name: name.to_string(),
            handle,
            content_type,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_list_is_trimmed_and_compacted() {
        assert_eq!(parse_fetch_list("a.mp4, missing.txt, b.png"), vec![
            "a.mp4",
            "missing.txt",
            "b.png"
        ]);
        assert_eq!(parse_fetch_list(" , ,x.gif,,  "), vec!["x.gif"]);
        assert!(parse_fetch_list("").is_empty());
    }
}
