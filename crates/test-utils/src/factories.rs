use std::sync::{Arc, Mutex};

use kosmos::errors::{KosmosError, Result};
use kosmos::pipeline::{Stage, Task, TaskFactory};
use kosmos::types::{TagMap, TaskId};

/// A task factory that:
/// - records `(stage name, task id)` for every task it creates
/// - builds plain tasks otherwise.
#[derive(Debug, Default, Clone)]
pub struct RecordingTaskFactory {
    created: Arc<Mutex<Vec<(String, TaskId)>>>,
}

impl RecordingTaskFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<(String, TaskId)> {
        self.created.lock().unwrap().clone()
    }
}

impl TaskFactory for RecordingTaskFactory {
    fn create_task(
        &mut self,
        stage: &Stage,
        id: TaskId,
        tags: TagMap,
        parents: Vec<TaskId>,
    ) -> Result<Task> {
        self.created
            .lock()
            .unwrap()
            .push((stage.name().to_string(), id));
        Ok(Task::new(id, tags, parents))
    }
}

/// A task factory that fails on the `fail_at`-th task it is asked to
/// create (0-based, counted across all stages).
#[derive(Debug, Clone)]
pub struct FailingTaskFactory {
    fail_at: usize,
    calls: usize,
}

impl FailingTaskFactory {
    pub fn new(fail_at: usize) -> Self {
        Self { fail_at, calls: 0 }
    }
}

impl TaskFactory for FailingTaskFactory {
    fn create_task(
        &mut self,
        stage: &Stage,
        id: TaskId,
        tags: TagMap,
        parents: Vec<TaskId>,
    ) -> Result<Task> {
        let call = self.calls;
        self.calls += 1;
        if call == self.fail_at {
            return Err(KosmosError::Other(anyhow::anyhow!(
                "factory refused task {id} of stage '{}'",
                stage.name()
            )));
        }
        Ok(Task::new(id, tags, parents))
    }
}
