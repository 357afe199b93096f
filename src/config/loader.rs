// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::Result;

/// Load a pipeline file from a given path without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "read pipeline file");

    let raw: RawPipelineFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a pipeline file from path and validate it.
///
/// Checks stage shapes, parent references, relationship parameters and
/// acyclicity of the stage graph.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let raw = load_from_path(&path)?;
    PipelineFile::try_from(raw)
}

/// Parse and validate a pipeline definition held in memory.
pub fn parse_pipeline(contents: &str) -> Result<PipelineFile> {
    let raw: RawPipelineFile = toml::from_str(contents)?;
    PipelineFile::try_from(raw)
}

/// `Kosmos.toml` in the current working directory.
pub fn default_pipeline_path() -> PathBuf {
    PathBuf::from("Kosmos.toml")
}
