//! Archive synthesis capability used when a run produces several files.

use crate::error::ArchiveResult;

/// Accumulates named entries and serialises them into a single archive blob.
pub trait ArchiveBuilder: Send {
    /// Append an entry under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written into the archive.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> ArchiveResult<()>;

    /// Finalise the archive and return its bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive trailer cannot be written.
    fn serialize(self: Box<Self>) -> ArchiveResult<Vec<u8>>;
}

/// Factory for fresh archive builders of one container format.
pub trait ArchiveFormat: Send + Sync {
    /// Start a new, empty archive.
    fn builder(&self) -> Box<dyn ArchiveBuilder>;

    /// Content type advertised for the serialised archive.
    fn content_type(&self) -> &'static str;
}
