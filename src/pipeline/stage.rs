// src/pipeline/stage.rs

use crate::rel::Relationship;
use crate::types::{StageId, TagMap};
use crate::pipeline::Task;

/// What a stage does with its parent stages' tasks.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StageKind {
    /// Input stage: tasks are declared literally, no parents.
    Source { tasks: Vec<TagMap> },
    /// Derived stage: tasks are generated from parent tasks.
    Derived {
        parents: Vec<StageId>,
        relationship: Relationship,
    },
}

/// Definition of a derived stage, as passed to
/// [`Pipeline::add_stage`](crate::pipeline::Pipeline::add_stage).
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: String,
    /// Parent stage names, in declaration order.
    pub parents: Vec<String>,
    pub relationship: Relationship,
    pub extra_tags: TagMap,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, relationship: Relationship) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            relationship,
            extra_tags: TagMap::new(),
        }
    }

    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parents.push(name.into());
        self
    }

    pub fn extra_tags(mut self, tags: TagMap) -> Self {
        self.extra_tags = tags;
        self
    }
}

/// A pipeline step. Owns its tasks once materialized.
#[derive(Debug, Clone)]
pub struct Stage {
    pub(crate) id: StageId,
    pub(crate) name: String,
    pub(crate) kind: StageKind,
    pub(crate) extra_tags: TagMap,
    /// `None` until materialized; populated exactly once.
    pub(crate) tasks: Option<Vec<Task>>,
}

impl Stage {
    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extra_tags(&self) -> &TagMap {
        &self.extra_tags
    }

    pub fn parents(&self) -> &[StageId] {
        match &self.kind {
            StageKind::Source { .. } => &[],
            StageKind::Derived { parents, .. } => parents,
        }
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        match &self.kind {
            StageKind::Source { .. } => None,
            StageKind::Derived { relationship, .. } => Some(relationship),
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.tasks.is_some()
    }

    /// Materialized tasks; empty if the stage has not been materialized.
    pub fn tasks(&self) -> &[Task] {
        self.tasks.as_deref().unwrap_or(&[])
    }
}
