// src/rel/one_to_one.rs

use tracing::debug;

use crate::rel::{Generated, NewTask, StageView};
use crate::types::merge_tags;

/// One new task per parent task, carrying the parent's tags overlaid with
/// `extra_tags`.
pub(crate) fn generate<'a>(view: &StageView<'a>) -> Generated<'a> {
    debug!(
        stage = view.name,
        parent_tasks = view.parent_task_count(),
        "one2one: generating one task per parent task"
    );

    let extra_tags = view.extra_tags.clone();
    Box::new(view.parent_tasks().map(move |parent| {
        let mut tags = parent.tags().clone();
        merge_tags(&mut tags, &extra_tags);
        NewTask {
            tags,
            dependencies: vec![parent],
        }
    }))
}
