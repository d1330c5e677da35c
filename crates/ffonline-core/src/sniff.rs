//! Content-type detection capability.

/// Result of inspecting a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedType {
    /// Detected MIME type, e.g. `image/png`.
    pub mime: String,
    /// Conventional extension for the detected type, without the dot.
    pub extension: Option<String>,
}

impl DetectedType {
    /// Construct a detection result from a MIME type and optional extension.
    #[must_use]
    pub fn new(mime: impl Into<String>, extension: Option<&str>) -> Self {
        Self {
            mime: mime.into(),
            extension: extension.map(str::to_string),
        }
    }
}

/// Detects a binary content type by inspecting bytes rather than file names.
pub trait ContentSniffer: Send + Sync {
    /// Inspect `bytes`; `None` when the content is not recognised.
    fn detect(&self, bytes: &[u8]) -> Option<DetectedType>;
}
