#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (byte fixtures, tool probes), mocks.rs (scripted in-memory engine).

pub mod fixtures;
pub mod mocks;

pub use mocks::{MemoryEngine, MemoryFs};
