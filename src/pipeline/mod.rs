// src/pipeline/mod.rs

//! Stage/task model and the engine that materializes stages.
//!
//! - [`task`] is the immutable task record.
//! - [`stage`] holds stage definitions and their materialized tasks.
//! - [`factory`] is the hook used to create concrete tasks.
//!
//! Stages are stored in insertion order and may only name earlier stages as
//! parents, so the stage graph is acyclic by construction and insertion
//! order is a valid materialization order.

pub mod factory;
pub mod stage;
pub mod task;

pub use factory::{DefaultTaskFactory, TaskFactory};
pub use stage::{Stage, StageSpec};
pub(crate) use stage::StageKind;
pub use task::Task;

use std::collections::HashMap;

use tracing::{debug, info, trace};

use crate::errors::{KosmosError, Result};
use crate::rel::StageView;
use crate::types::{StageId, TagMap, TaskId, format_tags, merge_tags};

/// An ordered set of stages plus their materialized tasks.
#[derive(Debug, Default, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    by_name: HashMap<String, StageId>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input stage whose tasks are given literally.
    pub fn add_source(&mut self, name: impl Into<String>, tasks: Vec<TagMap>) -> Result<StageId> {
        self.insert(name.into(), StageKind::Source { tasks }, TagMap::new())
    }

    /// Add a derived stage. Every parent must already be in the pipeline.
    pub fn add_stage(&mut self, spec: StageSpec) -> Result<StageId> {
        if spec.parents.is_empty() {
            return Err(KosmosError::Config(format!(
                "stage '{}' must have at least one parent stage",
                spec.name
            )));
        }

        let mut parents = Vec::with_capacity(spec.parents.len());
        for parent in &spec.parents {
            let id = self.by_name.get(parent).copied().ok_or_else(|| {
                KosmosError::Config(format!(
                    "stage '{}' has unknown parent stage '{}'",
                    spec.name, parent
                ))
            })?;
            if parents.contains(&id) {
                return Err(KosmosError::Config(format!(
                    "stage '{}' lists parent stage '{}' more than once",
                    spec.name, parent
                )));
            }
            parents.push(id);
        }

        self.insert(
            spec.name,
            StageKind::Derived {
                parents,
                relationship: spec.relationship,
            },
            spec.extra_tags,
        )
    }

    fn insert(&mut self, name: String, kind: StageKind, extra_tags: TagMap) -> Result<StageId> {
        if self.by_name.contains_key(&name) {
            return Err(KosmosError::Config(format!("duplicate stage name '{name}'")));
        }

        let id = StageId(self.stages.len());
        debug!(stage = %name, %id, "added stage");
        self.by_name.insert(name.clone(), id);
        self.stages.push(Stage {
            id,
            name,
            kind,
            extra_tags,
            tasks: None,
        });
        Ok(id)
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.0)
    }

    pub fn stage_by_name(&self, name: &str) -> Option<&Stage> {
        self.by_name.get(name).and_then(|id| self.stage(*id))
    }

    pub fn stage_id(&self, name: &str) -> Result<StageId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| KosmosError::StageNotFound(name.to_string()))
    }

    /// Stages in insertion order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.stage(id.stage)?.tasks().get(id.index)
    }

    /// Resolve the parent edges of a task.
    pub fn dependencies_of(&self, id: TaskId) -> Vec<&Task> {
        self.task(id)
            .map(|t| t.parents().iter().filter_map(|p| self.task(*p)).collect())
            .unwrap_or_default()
    }

    /// Materialize one stage's tasks.
    ///
    /// All parent stages must already be materialized. Tasks are installed
    /// only if every one of them was generated and created successfully; on
    /// error the stage stays unmaterialized. A stage that is already
    /// materialized is left untouched.
    pub fn materialize<F>(&mut self, id: StageId, factory: &mut F) -> Result<&[Task]>
    where
        F: TaskFactory + ?Sized,
    {
        let Some(stage) = self.stages.get(id.0) else {
            return Err(KosmosError::StageNotFound(id.to_string()));
        };

        if stage.is_materialized() {
            debug!(stage = %stage.name, "stage already materialized");
            return Ok(self.stages[id.0].tasks());
        }

        let pending = self.pending_tasks(stage)?;

        let mut tasks = Vec::with_capacity(pending.len());
        for (index, (tags, parents)) in pending.into_iter().enumerate() {
            let task_id = TaskId { stage: id, index };
            trace!(
                stage = %stage.name,
                task = %task_id,
                tags = %format_tags(&tags),
                deps = parents.len(),
                "creating task"
            );
            let task = factory.create_task(stage, task_id, tags, parents.clone())?;
            check_created_task(stage, &task, task_id, &parents)?;
            tasks.push(task);
        }

        info!(
            stage = %stage.name,
            relationship = stage.relationship().map(|r| r.label()).unwrap_or("source"),
            tasks = tasks.len(),
            "materialized stage"
        );

        let stage = &mut self.stages[id.0];
        stage.tasks = Some(tasks);
        Ok(stage.tasks())
    }

    /// Materialize every stage, in insertion order.
    pub fn materialize_all<F>(&mut self, factory: &mut F) -> Result<()>
    where
        F: TaskFactory + ?Sized,
    {
        for index in 0..self.stages.len() {
            self.materialize(StageId(index), factory)?;
        }
        Ok(())
    }

    /// Compute `(tags, parent ids)` for every task `stage` should get.
    fn pending_tasks(&self, stage: &Stage) -> Result<Vec<(TagMap, Vec<TaskId>)>> {
        match &stage.kind {
            StageKind::Source { tasks } => Ok(tasks
                .iter()
                .map(|declared| {
                    let mut tags = declared.clone();
                    merge_tags(&mut tags, &stage.extra_tags);
                    (tags, Vec::new())
                })
                .collect()),
            StageKind::Derived {
                parents,
                relationship,
            } => {
                let mut parent_tasks = Vec::with_capacity(parents.len());
                for parent_id in parents {
                    let parent = &self.stages[parent_id.0];
                    match &parent.tasks {
                        Some(tasks) => parent_tasks.push(tasks.as_slice()),
                        None => {
                            return Err(KosmosError::ParentNotMaterialized {
                                stage: stage.name.clone(),
                                parent: parent.name.clone(),
                            });
                        }
                    }
                }

                let view = StageView {
                    name: &stage.name,
                    parents: parent_tasks,
                    extra_tags: &stage.extra_tags,
                };

                Ok(relationship
                    .generate(&view)?
                    .map(|new| {
                        let deps = new.dependencies.iter().map(|t| t.id()).collect();
                        (new.tags, deps)
                    })
                    .collect())
            }
        }
    }
}

/// The engine owns ids and parent edges; a factory may only shape the rest.
fn check_created_task(stage: &Stage, task: &Task, expected: TaskId, parents: &[TaskId]) -> Result<()> {
    let reason = if task.id() != expected {
        "task id does not match its slot"
    } else if task.parents() != parents {
        "parent edges differ from the generated dependencies"
    } else {
        return Ok(());
    };

    Err(KosmosError::FactoryMismatch {
        stage: stage.name.clone(),
        expected,
        got: task.id(),
        reason: reason.to_string(),
    })
}
