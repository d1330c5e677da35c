//! Magic-number content detection backed by `infer`.

use ffonline_core::{ContentSniffer, DetectedType};

/// Detects content types from leading bytes using the `infer` matcher table.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferSniffer;

impl ContentSniffer for InferSniffer {
    fn detect(&self, bytes: &[u8]) -> Option<DetectedType> {
        infer::get(bytes).map(|kind| DetectedType::new(kind.mime_type(), Some(kind.extension())))
    }
}
