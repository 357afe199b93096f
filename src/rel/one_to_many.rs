// src/rel/one_to_many.rs

use tracing::debug;

use crate::rel::{Generated, NewTask, SplitBy, StageView};
use crate::types::{TagMap, merge_tags};

/// For every parent task and every split combination, one new task.
///
/// Tag precedence, lowest to highest: combination, parent tags, `extra_tags`.
pub(crate) fn generate<'a>(view: &StageView<'a>, split_by: &SplitBy) -> Generated<'a> {
    let combinations: Vec<TagMap> = split_by.combinations().collect();

    debug!(
        stage = view.name,
        parent_tasks = view.parent_task_count(),
        combinations = combinations.len(),
        "one2many: splitting parent tasks"
    );

    let extra_tags = view.extra_tags.clone();
    Box::new(view.parent_tasks().flat_map(move |parent| {
        let extra_tags = extra_tags.clone();
        combinations
            .clone()
            .into_iter()
            .map(move |mut tags| {
                merge_tags(&mut tags, parent.tags());
                merge_tags(&mut tags, &extra_tags);
                NewTask {
                    tags,
                    dependencies: vec![parent],
                }
            })
    }))
}
