// src/pipeline/task.rs

use crate::types::{TagMap, TaskId};

/// A unit of work belonging to one stage.
///
/// Tags and parent edges are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    tags: TagMap,
    /// Tasks from earlier stages this task depends on, in dependency order.
    parents: Vec<TaskId>,
}

impl Task {
    pub fn new(id: TaskId, tags: TagMap, parents: Vec<TaskId>) -> Self {
        Self { id, tags, parents }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    pub fn parents(&self) -> &[TaskId] {
        &self.parents
    }
}
