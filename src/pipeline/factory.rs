// src/pipeline/factory.rs

use crate::errors::Result;
use crate::pipeline::{Stage, Task};
use crate::types::{TagMap, TaskId};

/// Creates the concrete task for each generated `(tags, dependencies)` pair.
///
/// The pipeline assigns ids and dependency edges; the returned task must
/// keep both unchanged, or materialization fails with
/// [`KosmosError::FactoryMismatch`](crate::errors::KosmosError::FactoryMismatch).
/// A factory may reject a task; any error aborts materialization of the
/// whole stage.
pub trait TaskFactory {
    fn create_task(
        &mut self,
        stage: &Stage,
        id: TaskId,
        tags: TagMap,
        parents: Vec<TaskId>,
    ) -> Result<Task>;
}

/// Plain factory: builds the task as given.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTaskFactory;

impl TaskFactory for DefaultTaskFactory {
    fn create_task(
        &mut self,
        _stage: &Stage,
        id: TaskId,
        tags: TagMap,
        parents: Vec<TaskId>,
    ) -> Result<Task> {
        Ok(Task::new(id, tags, parents))
    }
}
