//! Zip archive collaborator.

use std::io::{Cursor, Write};

use ffonline_core::{ArchiveBuilder, ArchiveError, ArchiveFormat, ArchiveResult};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Builds in-memory zip archives.
#[derive(Debug, Clone, Copy)]
pub struct ZipFormat {
    compression: CompressionMethod,
}

impl ZipFormat {
    /// Zip format using deflate compression.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }

    /// Zip format storing entries without compression.
    #[must_use]
    pub const fn stored() -> Self {
        Self {
            compression: CompressionMethod::Stored,
        }
    }
}

impl Default for ZipFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveFormat for ZipFormat {
    fn builder(&self) -> Box<dyn ArchiveBuilder> {
        Box::new(ZipBuilder {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(self.compression),
        })
    }

    fn content_type(&self) -> &'static str {
        ZIP_CONTENT_TYPE
    }
}

struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
}

impl ArchiveBuilder for ZipBuilder {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> ArchiveResult<()> {
        let entry_error = |source: Box<dyn std::error::Error + Send + Sync>| ArchiveError::Entry {
            name: name.to_string(),
            source,
        };
        self.writer
            .start_file(name, self.options)
            .map_err(|err| entry_error(err.into()))?;
        self.writer
            .write_all(bytes)
            .map_err(|err| entry_error(err.into()))
    }

    fn serialize(mut self: Box<Self>) -> ArchiveResult<Vec<u8>> {
        self.writer
            .finish()
            .map(Cursor::into_inner)
            .map_err(|err| ArchiveError::Serialize { source: err.into() })
    }
}
