#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Native media engine backed by an `ffmpeg` executable.
//!
//! The engine filesystem is a private temporary directory that lives as long
//! as the engine; every command runs with it as the working directory.
//!
//! Layout: `engine.rs` (`FfmpegEngine`), `progress.rs` (stderr line splitting
//! and progress parsing), `paths.rs` (name to path mapping).

pub mod engine;
mod paths;
pub mod progress;

pub use engine::{DEFAULT_BINARY, FfmpegEngine};
pub use progress::{LineSplitter, ProgressParser};
