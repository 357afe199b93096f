// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::{KosmosError, Result};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = crate::errors::KosmosError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        let order = validate_pipeline(&raw)?;
        Ok(PipelineFile::new_unchecked(raw.stage, order))
    }
}

/// Validate a raw definition and return its stage names in a valid
/// materialization order.
pub fn validate_pipeline(cfg: &RawPipelineFile) -> Result<Vec<String>> {
    ensure_has_stages(cfg)?;
    validate_stage_shapes(cfg)?;
    validate_stage_parents(cfg)?;
    validate_relationships(cfg)?;
    stage_order(cfg)
}

fn ensure_has_stages(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.stage.is_empty() {
        return Err(KosmosError::Config(
            "pipeline must contain at least one [stage.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_stage_shapes(cfg: &RawPipelineFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        if stage.is_source() {
            if !stage.parents.is_empty() {
                return Err(KosmosError::Config(format!(
                    "source stage '{}' declares `tasks` and cannot also have `parents`",
                    name
                )));
            }
            if stage.rel.is_some() {
                return Err(KosmosError::Config(format!(
                    "source stage '{}' declares `tasks` and cannot also have `rel`",
                    name
                )));
            }
        } else {
            if stage.parents.is_empty() {
                return Err(KosmosError::Config(format!(
                    "stage '{}' must list at least one parent in `parents` (or declare `tasks`)",
                    name
                )));
            }
            if stage.rel.is_none() {
                return Err(KosmosError::Config(format!(
                    "stage '{}' has parents but no `rel`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_stage_parents(cfg: &RawPipelineFile) -> Result<()> {
    for (name, stage) in cfg.stage.iter() {
        for (i, parent) in stage.parents.iter().enumerate() {
            if !cfg.stage.contains_key(parent) {
                return Err(KosmosError::Config(format!(
                    "stage '{}' has unknown parent '{}' in `parents`",
                    name, parent
                )));
            }
            if parent == name {
                return Err(KosmosError::Config(format!(
                    "stage '{}' cannot be its own parent",
                    name
                )));
            }
            if stage.parents[..i].contains(parent) {
                return Err(KosmosError::Config(format!(
                    "stage '{}' lists parent '{}' more than once",
                    name, parent
                )));
            }
        }
    }
    Ok(())
}

/// Relationship parameters go through the same constructors the core uses,
/// so authoring errors surface before anything is materialized.
fn validate_relationships(cfg: &RawPipelineFile) -> Result<()> {
    for stage in cfg.stage.values() {
        if let Some(rel) = &stage.rel {
            rel.to_relationship()?;
        }
    }
    Ok(())
}

fn stage_order(cfg: &RawPipelineFile) -> Result<Vec<String>> {
    // Edge direction: parent -> stage
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.stage.keys() {
        graph.add_node(name.as_str());
    }

    for (name, stage) in cfg.stage.iter() {
        for parent in stage.parents.iter() {
            graph.add_edge(parent.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(KosmosError::DagCycle(format!(
                "cycle detected in stage graph involving stage '{}'",
                node
            )))
        }
    }
}
