// src/rel/many_to_many.rs

use tracing::debug;

use crate::errors::Result;
use crate::rel::{Generated, Keywords, NewTask, SplitBy, StageView, reduce};
use crate::types::{TagMap, merge_tags};

/// Fan-in by `keywords`, then fan each group out over `split_by`.
///
/// Every task derived from one group shares that group's dependency list.
/// Tag precedence, lowest to highest: combination, group key, `extra_tags`.
pub(crate) fn generate<'a>(
    view: &StageView<'a>,
    keywords: &Keywords,
    split_by: &SplitBy,
) -> Result<Generated<'a>> {
    let groups = reduce(view, keywords)?;
    let combinations: Vec<TagMap> = split_by.combinations().collect();

    debug!(
        stage = view.name,
        groups = groups.len(),
        combinations = combinations.len(),
        "many2many: splitting reduced groups"
    );

    let extra_tags = view.extra_tags.clone();
    Ok(Box::new(groups.into_iter().flat_map(move |(key, dependencies)| {
        let extra_tags = extra_tags.clone();
        combinations
            .clone()
            .into_iter()
            .map(move |mut tags| {
                merge_tags(&mut tags, &key);
                merge_tags(&mut tags, &extra_tags);
                NewTask {
                    tags,
                    dependencies: dependencies.clone(),
                }
            })
    })))
}
