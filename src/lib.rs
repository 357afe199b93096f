// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod groupby;
pub mod logging;
pub mod pipeline;
pub mod rel;
pub mod types;

use std::fmt::Write as _;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::PipelineFile;
use crate::errors::KosmosError;
use crate::pipeline::{DefaultTaskFactory, Pipeline, Stage};
use crate::types::format_tags;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the pipeline definition, then either prints the
/// stage definitions (`--dry-run`) or materializes every stage and prints
/// the resulting tasks with their dependency edges.
pub fn run(args: CliArgs) -> Result<()> {
    let file = load_and_validate(&args.pipeline)?;

    if args.dry_run {
        print!("{}", render_dry_run(&file)?);
        debug!("dry-run complete (nothing materialized)");
        return Ok(());
    }

    let mut pipeline = file.build()?;
    let mut factory = DefaultTaskFactory;
    pipeline.materialize_all(&mut factory)?;

    let total: usize = pipeline.stages().map(|s| s.tasks().len()).sum();
    info!(stages = pipeline.len(), tasks = total, "pipeline materialized");

    print!("{}", render_report(&pipeline, args.stage.as_deref())?);
    Ok(())
}

/// Stage definitions in materialization order.
pub fn render_dry_run(file: &PipelineFile) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "kosmos dry-run")?;
    writeln!(out, "stages ({}):", file.order().len())?;

    for (name, stage) in file.stages_in_order() {
        writeln!(out, "  - {name}")?;
        match (&stage.tasks, &stage.rel) {
            (Some(tasks), _) => {
                writeln!(out, "      source: {} task(s)", tasks.len())?;
            }
            (None, Some(rel)) => {
                writeln!(out, "      parents: {:?}", stage.parents)?;
                writeln!(out, "      rel: {rel:?}")?;
            }
            (None, None) => {}
        }
        if !stage.extra_tags.is_empty() {
            writeln!(out, "      extra_tags: {}", format_tags(&stage.extra_tags))?;
        }
    }

    Ok(out)
}

/// Materialized tasks of every stage, or only of `only_stage`.
pub fn render_report(pipeline: &Pipeline, only_stage: Option<&str>) -> Result<String> {
    let stages: Vec<&Stage> = match only_stage {
        Some(name) => vec![
            pipeline
                .stage_by_name(name)
                .ok_or_else(|| KosmosError::StageNotFound(name.to_string()))?,
        ],
        None => pipeline.stages().collect(),
    };

    let mut out = String::new();
    for stage in stages {
        let parents = stage
            .parents()
            .iter()
            .filter_map(|id| pipeline.stage(*id).map(|p| p.name()))
            .collect::<Vec<_>>();
        let rel = stage.relationship().map(|r| r.label()).unwrap_or("source");

        writeln!(
            out,
            "stage {} [{}] parents={:?} tasks={}",
            stage.name(),
            rel,
            parents,
            stage.tasks().len()
        )?;
        for task in stage.tasks() {
            let deps = task
                .parents()
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "  {} {} <- [{}]", task.id(), format_tags(task.tags()), deps)?;
        }
    }

    Ok(out)
}
