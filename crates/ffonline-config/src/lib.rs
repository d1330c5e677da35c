#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(unreachable_pub, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! Template catalog and pipeline settings.
//!
//! Layout: `model.rs` (templates, segments, roles, categories), `validate.rs`
//! (load-time arity and role checks), `catalog.rs` (`TemplateCatalog` with the
//! built-in templates), `settings.rs` (`PipelineSettings`), `error.rs`.

pub mod catalog;
pub mod error;
pub mod model;
pub mod settings;
pub mod validate;

pub use catalog::{DEFAULT_TEMPLATE_KEY, TemplateCatalog, TemplateGroup};
pub use error::{CatalogError, CatalogResult, SettingsError, SettingsResult};
pub use model::{Category, Segment, SegmentRole, Template, TemplateDefinition};
pub use settings::{DetectionPolicy, PipelineSettings};
pub use validate::validate_definition;
