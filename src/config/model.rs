// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::errors::{KosmosError, Result};
use crate::pipeline::{Pipeline, StageSpec};
use crate::rel::{Relationship, Split};
use crate::types::{TagMap, TagValue, merge_tags};

/// Pipeline definition as read from a TOML file, before validation.
///
/// ```toml
/// [stage.input]
/// tasks = [ { sample = "a" }, { sample = "b" } ]
///
/// [stage.align]
/// parents = ["input"]
/// rel = { type = "one2one" }
/// extra_tags = { tool = "bwa" }
///
/// [stage.call]
/// parents = ["align"]
/// rel = { type = "many2many", keywords = ["sample"], split_by = [
///     { key = "chrom", values = ["1", "2"] },
/// ] }
/// ```
///
/// Use [`PipelineFile`] (via `TryFrom`) for a validated definition.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPipelineFile {
    /// All stages from `[stage.<name>]`, keyed by stage name.
    #[serde(default)]
    pub stage: BTreeMap<String, StageConfig>,
}

/// `[stage.<name>]` section.
///
/// A stage is either a source (`tasks = [...]`, no parents) or derived
/// (`parents` + `rel`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StageConfig {
    /// Parent stage names, in declaration order.
    #[serde(default)]
    pub parents: Vec<String>,

    #[serde(default)]
    pub rel: Option<RelationshipConfig>,

    /// Literal task tags for source stages.
    #[serde(default)]
    pub tasks: Option<Vec<TagMap>>,

    /// Tags merged into every task of this stage, overriding everything else.
    #[serde(default)]
    pub extra_tags: TagMap,
}

impl StageConfig {
    pub fn is_source(&self) -> bool {
        self.tasks.is_some()
    }
}

/// `rel = { type = "...", ... }`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum RelationshipConfig {
    #[serde(rename = "one2one")]
    OneToOne,
    #[serde(rename = "many2one")]
    ManyToOne { keywords: Vec<String> },
    #[serde(rename = "one2many")]
    OneToMany {
        #[serde(default)]
        split_by: Vec<SplitConfig>,
    },
    #[serde(rename = "many2many")]
    ManyToMany {
        keywords: Vec<String>,
        #[serde(default)]
        split_by: Vec<SplitConfig>,
    },
}

/// `{ key = "chrom", values = ["1", "2"] }`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SplitConfig {
    pub key: String,
    #[serde(default)]
    pub values: Vec<TagValue>,
}

impl RelationshipConfig {
    /// Build the validated relationship.
    pub fn to_relationship(&self) -> Result<Relationship> {
        match self {
            RelationshipConfig::OneToOne => Ok(Relationship::one_to_one()),
            RelationshipConfig::ManyToOne { keywords } => {
                Relationship::many_to_one(keywords.iter().cloned())
            }
            RelationshipConfig::OneToMany { split_by } => {
                Relationship::one_to_many(splits(split_by))
            }
            RelationshipConfig::ManyToMany { keywords, split_by } => {
                Relationship::many_to_many(keywords.iter().cloned(), splits(split_by))
            }
        }
    }
}

fn splits(cfg: &[SplitConfig]) -> Vec<Split> {
    cfg.iter()
        .map(|s| Split {
            key: s.key.clone(),
            values: s.values.clone(),
        })
        .collect()
}

/// A validated pipeline definition.
///
/// Guarantees: at least one stage, every stage is a well-formed source or
/// derived stage, all parents exist, the stage graph is acyclic and every
/// relationship's parameters are valid.
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pub stage: BTreeMap<String, StageConfig>,
    /// Stage names in a valid materialization order.
    order: Vec<String>,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(stage: BTreeMap<String, StageConfig>, order: Vec<String>) -> Self {
        Self { stage, order }
    }

    /// Stage names, parents before children.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Iterate stages in materialization order.
    pub fn stages_in_order(&self) -> impl Iterator<Item = (&str, &StageConfig)> {
        self.order
            .iter()
            .filter_map(|name| self.stage.get(name).map(|s| (name.as_str(), s)))
    }

    /// Turn the definition into an (unmaterialized) [`Pipeline`].
    pub fn build(&self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new();

        for (name, stage) in self.stages_in_order() {
            match (&stage.tasks, &stage.rel) {
                (Some(tasks), _) => {
                    let tasks = tasks
                        .iter()
                        .map(|declared| {
                            let mut tags = declared.clone();
                            merge_tags(&mut tags, &stage.extra_tags);
                            tags
                        })
                        .collect();
                    pipeline.add_source(name, tasks)?;
                }
                (None, Some(rel)) => {
                    let spec = StageSpec {
                        name: name.to_string(),
                        parents: stage.parents.clone(),
                        relationship: rel.to_relationship()?,
                        extra_tags: stage.extra_tags.clone(),
                    };
                    pipeline.add_stage(spec)?;
                }
                (None, None) => {
                    return Err(KosmosError::Config(format!(
                        "stage '{name}' needs either `tasks` or `rel`"
                    )));
                }
            }
        }

        debug!(stages = pipeline.len(), "built pipeline from definition");
        Ok(pipeline)
    }
}
