#![allow(dead_code)]

use kosmos::pipeline::Task;
use kosmos::rel::StageView;
use kosmos::types::{StageId, TagMap, TagValue, TaskId};

/// Build a tag map from `(key, value)` pairs.
pub fn tags<V>(pairs: &[(&str, V)]) -> TagMap
where
    V: Clone + Into<TagValue>,
{
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone().into()))
        .collect()
}

/// Tasks of one already-materialized parent stage.
///
/// Ids are `stage.index` with `index` following the order of `tag_maps`.
pub fn stage_tasks(stage: usize, tag_maps: Vec<TagMap>) -> Vec<Task> {
    tag_maps
        .into_iter()
        .enumerate()
        .map(|(index, t)| {
            Task::new(
                TaskId {
                    stage: StageId(stage),
                    index,
                },
                t,
                Vec::new(),
            )
        })
        .collect()
}

/// Builder for a [`StageView`] over borrowed parent task lists.
pub struct StageViewBuilder<'a> {
    name: &'a str,
    parents: Vec<&'a [Task]>,
    extra_tags: &'a TagMap,
}

impl<'a> StageViewBuilder<'a> {
    pub fn new(name: &'a str, extra_tags: &'a TagMap) -> Self {
        Self {
            name,
            parents: Vec::new(),
            extra_tags,
        }
    }

    pub fn parent(mut self, tasks: &'a [Task]) -> Self {
        self.parents.push(tasks);
        self
    }

    pub fn build(self) -> StageView<'a> {
        StageView {
            name: self.name,
            parents: self.parents,
            extra_tags: self.extra_tags,
        }
    }
}

/// Ids of a dependency list, for compact assertions.
pub fn ids(tasks: &[&Task]) -> Vec<TaskId> {
    tasks.iter().map(|t| t.id()).collect()
}

/// `TaskId` shorthand.
pub fn tid(stage: usize, index: usize) -> TaskId {
    TaskId {
        stage: StageId(stage),
        index,
    }
}
