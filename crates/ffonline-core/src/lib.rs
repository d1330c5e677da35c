#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Engine-agnostic collaborator interfaces for the conversion pipeline.
//!
//! Layout: `engine.rs` (media engine capability surface and progress sink),
//! `archive.rs` (archive synthesis capability), `sniff.rs` (content-type
//! detection capability), `error.rs` (shared error types).

pub mod archive;
pub mod engine;
pub mod error;
pub mod sniff;

pub use archive::{ArchiveBuilder, ArchiveFormat};
pub use engine::{MediaEngine, ProgressSink};
pub use error::{ArchiveError, ArchiveResult, BoxError, EngineError, EngineResult};
pub use sniff::{ContentSniffer, DetectedType};
