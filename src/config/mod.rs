// src/config/mod.rs

//! Pipeline definitions in TOML.
//!
//! - [`model`]: the TOML-backed data model.
//! - [`loader`]: reading a definition from disk or a string.
//! - [`validate`]: shape, reference and acyclicity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_pipeline_path, load_and_validate, load_from_path, parse_pipeline};
pub use model::{PipelineFile, RawPipelineFile, RelationshipConfig, SplitConfig, StageConfig};
pub use validate::validate_pipeline;
