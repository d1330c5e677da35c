#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Command execution and output reconciliation pipeline.
//!
//! Layout: `assembler.rs` (template + overrides into an `ExecutionRequest`),
//! `snapshot.rs` (engine filesystem snapshot/diff), `gate.rs` (engine
//! initialisation gate), `service.rs` (`ExecutionPipeline` run state machine),
//! `packager.rs` (produced files into an `OutputBundle`), `fetch.rs` (manual
//! fetch path), `resources.rs` (downloadable resource handles), `archive.rs`
//! (zip archive collaborator), `sniff.rs` (magic-number content detection).

pub mod archive;
pub mod assembler;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod model;
pub mod packager;
pub mod resources;
pub mod service;
pub mod sniff;
pub mod snapshot;

pub use archive::ZipFormat;
pub use assembler::{CommandDraft, CommandOverrides, ExecutionRequest, assemble, tokenize_options};
pub use error::{FetchError, PipelineError, PipelineResult, describe_error};
pub use fetch::{FetchResult, FetchedFile, ManualFetch, parse_fetch_list};
pub use gate::{EngineGate, EngineState};
pub use model::{BundleKind, OutputBundle, RunOutcome, RunState, StagedFile};
pub use packager::OutputPackager;
pub use resources::{Resource, ResourceHandle, ResourceRegistry};
pub use service::ExecutionPipeline;
pub use sniff::InferSniffer;
pub use snapshot::Snapshot;
