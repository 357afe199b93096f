// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::loader::default_pipeline_path;

/// Command-line arguments for `kosmos`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "kosmos",
    version,
    about = "Materialize the tasks and dependency edges of a tag-driven pipeline.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline definition (TOML).
    ///
    /// Default: `Kosmos.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_pipeline_path())]
    pub pipeline: PathBuf,

    /// Only print the tasks of this stage (all stages are still
    /// materialized, since it depends on its ancestors).
    #[arg(long, value_name = "NAME")]
    pub stage: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KOSMOS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate and print the stage definitions without
    /// materializing any task.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
