#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! ffonline session wiring for a presentation layer.
//!
//! Layout: `bootstrap.rs` (environment loading and engine wiring),
//! `workbench.rs` (selection, staged files, bundles, fetch results),
//! `status.rs` (user-visible status text), `error.rs`.

/// Application bootstrap and environment loading.
pub mod bootstrap;
pub mod error;
pub mod status;
pub mod workbench;

pub use bootstrap::{BootstrapDependencies, run_app};
pub use error::{AppError, AppResult};
pub use status::{Status, StatusBoard, StatusLevel, format_progress};
pub use workbench::{RunReport, Workbench};
