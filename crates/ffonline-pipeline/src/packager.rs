//! Output packaging: produced files into at most one downloadable bundle.
//!
//! # Design
//! - Zero files yield no bundle, one file is published as-is under its own name,
//!   several files are zipped and offered under the configured archive name.
//! - The single-file content type comes from the bytes, never the name.
//! - Archive synthesis runs on the blocking pool.

use std::collections::BTreeSet;
use std::sync::Arc;

use ffonline_config::{DetectionPolicy, PipelineSettings};
use ffonline_core::{ArchiveFormat, ArchiveResult, ContentSniffer, MediaEngine};
use tracing::{debug, warn};

use crate::archive::ZipFormat;
use crate::error::{PipelineError, PipelineResult};
use crate::model::{BundleKind, OutputBundle};
use crate::resources::ResourceRegistry;
use crate::sniff::InferSniffer;

/// Turns a produced-file set into an [`OutputBundle`].
#[derive(Clone)]
pub struct OutputPackager {
    sniffer: Arc<dyn ContentSniffer>,
    archive: Arc<dyn ArchiveFormat>,
    resources: ResourceRegistry,
    settings: Arc<PipelineSettings>,
}

impl OutputPackager {
    /// Packager using `infer` detection and zip archives.
    #[must_use]
    pub fn new(settings: Arc<PipelineSettings>, resources: ResourceRegistry) -> Self {
        Self::with_collaborators(
            settings,
            resources,
            Arc::new(InferSniffer),
            Arc::new(ZipFormat::new()),
        )
    }

    /// Packager with explicit detection and archive collaborators.
    #[must_use]
    pub fn with_collaborators(
        settings: Arc<PipelineSettings>,
        resources: ResourceRegistry,
        sniffer: Arc<dyn ContentSniffer>,
        archive: Arc<dyn ArchiveFormat>,
    ) -> Self {
        Self {
            sniffer,
            archive,
            resources,
            settings,
        }
    }

    /// Registry bundles are published into.
    #[must_use]
    pub const fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Content type for `bytes` under the configured detection policy.
    /// `None` means detection failed and the policy is strict.
    #[must_use]
    pub fn classify(&self, name: &str, bytes: &[u8]) -> Option<String> {
        if let Some(detected) = self.sniffer.detect(bytes) {
            return Some(detected.mime);
        }
        match self.settings.detection {
            DetectionPolicy::Fallback => {
                warn!(
                    file = name,
                    fallback = %self.settings.fallback_content_type,
                    "content type not detected; using fallback"
                );
                Some(self.settings.fallback_content_type.clone())
            }
            DetectionPolicy::Strict => None,
        }
    }

    /// Package `produced`, reading each file from `engine`.
    ///
    /// # Errors
    ///
    /// Returns an error when a produced file cannot be read, the single file's
    /// type cannot be detected under strict detection, or the archive cannot
    /// be built.
    pub async fn package(
        &self,
        engine: &dyn MediaEngine,
        produced: &BTreeSet<String>,
    ) -> PipelineResult<Option<OutputBundle>> {
        let mut names = produced.iter();
        match (names.next(), names.next()) {
            (None, _) => Ok(None),
            (Some(name), None) => self.package_single(engine, name).await.map(Some),
            (Some(_), Some(_)) => self.package_archive(engine, produced).await.map(Some),
        }
    }

    async fn package_single(
        &self,
        engine: &dyn MediaEngine,
        name: &str,
    ) -> PipelineResult<OutputBundle> {
        let bytes = read_produced(engine, name).await?;
        let content_type =
            self.classify(name, &bytes)
                .ok_or_else(|| PipelineError::Detection {
                    file: name.to_string(),
                })?;

        let size = bytes.len();
        let handle = self.resources.publish(name, &content_type, bytes);
        debug!(file = name, content_type = %content_type, size, "single output packaged");
        Ok(OutputBundle {
            handle,
            suggested_filename: name.to_string(),
            content_type,
            size,
            kind: BundleKind::Single,
        })
    }

    async fn package_archive(
        &self,
        engine: &dyn MediaEngine,
        produced: &BTreeSet<String>,
    ) -> PipelineResult<OutputBundle> {
        let mut entries = Vec::with_capacity(produced.len());
        for name in produced {
            entries.push((name.clone(), read_produced(engine, name).await?));
        }

        let count = entries.len();
        let format = Arc::clone(&self.archive);
        let bytes = tokio::task::spawn_blocking(move || -> ArchiveResult<Vec<u8>> {
            let mut builder = format.builder();
            for (name, bytes) in &entries {
                builder.add_entry(name, bytes)?;
            }
            builder.serialize()
        })
        .await
        .map_err(|source| PipelineError::Task {
            operation: "archive",
            source,
        })?
        .map_err(|source| PipelineError::Archive { source })?;

        let size = bytes.len();
        let name = self.settings.archive_name.as_str();
        let content_type = self.archive.content_type();
        let handle = self.resources.publish(name, content_type, bytes);
        debug!(file = name, entries = count, size, "archive output packaged");
        Ok(OutputBundle {
            handle,
            suggested_filename: name.to_string(),
            content_type: content_type.to_string(),
            size,
            kind: BundleKind::Archive { entries: count },
        })
    }
}

async fn read_produced(engine: &dyn MediaEngine, name: &str) -> PipelineResult<Vec<u8>> {
    engine
        .read_file(name)
        .await
        .map_err(|source| PipelineError::ReadProduced {
            file: name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffonline_test_support::MemoryEngine;
    use ffonline_test_support::fixtures::{gif_bytes, png_bytes, text_bytes};
    use std::io::{Cursor, Read};

    type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

    fn packager(settings: PipelineSettings) -> OutputPackager {
        OutputPackager::new(Arc::new(settings), ResourceRegistry::new())
    }

    fn produced(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    async fn loaded(engine: MemoryEngine) -> TestResult<MemoryEngine> {
        engine.load().await?;
        Ok(engine)
    }

    #[tokio::test]
    async fn nothing_produced_is_not_an_error() -> TestResult<()> {
        let engine = loaded(MemoryEngine::new()).await?;
        let bundle = packager(PipelineSettings::default())
            .package(&engine, &BTreeSet::new())
            .await?;
        assert!(bundle.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn single_file_uses_detected_type_not_extension() -> TestResult<()> {
        let engine = loaded(MemoryEngine::new().with_file("output.mp4", gif_bytes())).await?;
        let packager = packager(PipelineSettings::default());
        let bundle = packager
            .package(&engine, &produced(&["output.mp4"]))
            .await?
            .ok_or("expected bundle")?;
        assert_eq!(bundle.suggested_filename, "output.mp4");
        assert_eq!(bundle.content_type, "image/gif");
        assert_eq!(bundle.kind, BundleKind::Single);

        let resource = packager
            .resources()
            .get(&bundle.handle)
            .ok_or("resource missing")?;
        assert_eq!(&*resource.bytes, gif_bytes().as_slice());
        assert_eq!(resource.content_type, "image/gif");
        Ok(())
    }

    #[tokio::test]
    async fn undetected_single_file_follows_policy() -> TestResult<()> {
        let engine = loaded(MemoryEngine::new().with_file("log.txt", text_bytes())).await?;

        let bundle = packager(PipelineSettings::default())
            .package(&engine, &produced(&["log.txt"]))
            .await?
            .ok_or("expected bundle")?;
        assert_eq!(bundle.content_type, "application/octet-stream");

        let strict = PipelineSettings {
            detection: DetectionPolicy::Strict,
            ..PipelineSettings::default()
        };
        let err = packager(strict)
            .package(&engine, &produced(&["log.txt"]))
            .await;
        assert!(matches!(err, Err(PipelineError::Detection { file }) if file == "log.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn several_files_become_one_archive() -> TestResult<()> {
        let engine = loaded(
            MemoryEngine::new()
                .with_file("frame-1.png", png_bytes())
                .with_file("frame-2.png", png_bytes())
                .with_file("palette.gif", gif_bytes()),
        )
        .await?;
        let packager = packager(PipelineSettings::default());
        let bundle = packager
            .package(&engine, &produced(&["frame-1.png", "frame-2.png", "palette.gif"]))
            .await?
            .ok_or("expected bundle")?;
        assert_eq!(bundle.suggested_filename, "output.zip");
        assert_eq!(bundle.content_type, "application/zip");
        assert_eq!(bundle.kind, BundleKind::Archive { entries: 3 });

        let resource = packager
            .resources()
            .get(&bundle.handle)
            .ok_or("resource missing")?;
        let mut archive = zip::ZipArchive::new(Cursor::new(resource.bytes.to_vec()))?;
        assert_eq!(archive.len(), 3);
        let mut palette = Vec::new();
        archive.by_name("palette.gif")?.read_to_end(&mut palette)?;
        assert_eq!(palette, gif_bytes());
        let mut frame = Vec::new();
        archive.by_name("frame-2.png")?.read_to_end(&mut frame)?;
        assert_eq!(frame, png_bytes());
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_produced_file_fails_packaging() -> TestResult<()> {
        let engine = loaded(
            MemoryEngine::new()
                .with_file("a.gif", gif_bytes())
                .with_file("b.gif", gif_bytes())
                .failing_read("b.gif"),
        )
        .await?;
        let packager = packager(PipelineSettings::default());
        let err = packager.package(&engine, &produced(&["a.gif", "b.gif"])).await;
        assert!(matches!(err, Err(PipelineError::ReadProduced { file, .. }) if file == "b.gif"));
        assert_eq!(packager.resources().live_handles(), 0);
        Ok(())
    }
}
