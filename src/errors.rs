// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum KosmosError {
    /// A many-to-one / many-to-many relationship was built with bad keywords.
    #[error("Invalid keywords: {0}")]
    InvalidKeywords(String),

    /// A one-to-many / many-to-many relationship was built with a bad split.
    #[error("Invalid split_by: {0}")]
    InvalidSplitBy(String),

    /// No parent task carries every grouping keyword.
    #[error(
        "stage '{stage}': parent stages must have at least one task with all many2one keywords of {keywords:?}"
    )]
    NoMatchingParents { stage: String, keywords: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cycle detected in stage graph: {0}")]
    DagCycle(String),

    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("stage '{stage}' cannot be materialized before its parent '{parent}'")]
    ParentNotMaterialized { stage: String, parent: String },

    /// A task factory changed the id or parent edges it was given.
    #[error("stage '{stage}': task factory returned {got} for slot {expected}: {reason}")]
    FactoryMismatch {
        stage: String,
        expected: TaskId,
        got: TaskId,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, KosmosError>;
