// src/rel/many_to_one.rs

use tracing::{debug, trace};

use crate::errors::{KosmosError, Result};
use crate::groupby::group_by_ordered;
use crate::pipeline::Task;
use crate::rel::{Generated, Keywords, NewTask, StageView};
use crate::types::{TagMap, format_tags, merge_tags};

/// Group parent tasks by their values for `keywords`.
///
/// Returns one `(key_tags, dependencies)` pair per distinct combination of
/// keyword values, in first-seen order. `dependencies` holds the tasks of
/// that group followed by every parent task that lacks at least one keyword:
/// such tasks are not distinguished by the grouping, so each group depends
/// on all of them.
///
/// Fails with [`KosmosError::NoMatchingParents`] if no parent task carries
/// every keyword.
pub fn reduce<'a>(
    view: &StageView<'a>,
    keywords: &Keywords,
) -> Result<Vec<(TagMap, Vec<&'a Task>)>> {
    let (complete, incomplete): (Vec<&'a Task>, Vec<&'a Task>) = view
        .parent_tasks()
        .partition(|t| keywords.all_present_in(t.tags()));

    if complete.is_empty() {
        return Err(KosmosError::NoMatchingParents {
            stage: view.name.to_string(),
            keywords: keywords.as_slice().to_vec(),
        });
    }

    let groups = group_by_ordered(complete, |t| keywords.project(t.tags()));

    debug!(
        stage = view.name,
        ?keywords,
        groups = groups.len(),
        passthrough = incomplete.len(),
        "reduced parent tasks"
    );

    Ok(groups
        .into_iter()
        .map(|(key, mut members)| {
            trace!(stage = view.name, key = %format_tags(&key), members = members.len(), "group");
            members.extend(incomplete.iter().copied());
            (key, members)
        })
        .collect())
}

/// One new task per keyword group, tagged with the group key overlaid with
/// `extra_tags`.
pub(crate) fn generate<'a>(view: &StageView<'a>, keywords: &Keywords) -> Result<Generated<'a>> {
    let groups = reduce(view, keywords)?;
    let extra_tags = view.extra_tags.clone();

    Ok(Box::new(groups.into_iter().map(move |(mut tags, dependencies)| {
        merge_tags(&mut tags, &extra_tags);
        NewTask { tags, dependencies }
    })))
}
