use std::collections::HashSet;

use kosmos::pipeline::Task;
use kosmos::rel::{NewTask, Relationship, Split};
use kosmos::types::{TagMap, TagValue, TaskId};
use kosmos_test_utils::builders::{StageViewBuilder, ids, stage_tasks};
use proptest::prelude::*;

// Tags are drawn from a small key/value alphabet so that grouping keys
// collide often and some tasks miss some keys.
fn tag_map_strategy() -> impl Strategy<Value = TagMap> {
    proptest::collection::btree_map(
        prop::sample::select(vec!["sample", "lane", "chrom", "tool"]).prop_map(str::to_string),
        prop::sample::select(vec!["a", "b", "c"]).prop_map(TagValue::from),
        0..4,
    )
}

fn parent_stages_strategy() -> impl Strategy<Value = Vec<Vec<TagMap>>> {
    proptest::collection::vec(proptest::collection::vec(tag_map_strategy(), 0..6), 1..3)
}

fn splits_strategy() -> impl Strategy<Value = Vec<Split>> {
    proptest::collection::vec(0..4usize, 0..3).prop_map(|lens| {
        lens.into_iter()
            .enumerate()
            .map(|(i, len)| Split::new(format!("split{i}"), (0..len as i64).collect::<Vec<_>>()))
            .collect()
    })
}

fn extra_tags_strategy() -> impl Strategy<Value = TagMap> {
    proptest::collection::btree_map(
        prop::sample::select(vec!["tool", "split0"]).prop_map(str::to_string),
        Just(TagValue::from("extra")),
        0..2,
    )
}

fn to_stages(raw: Vec<Vec<TagMap>>) -> Vec<Vec<Task>> {
    raw.into_iter()
        .enumerate()
        .map(|(i, maps)| stage_tasks(i, maps))
        .collect()
}

fn run(
    rel: &Relationship,
    stages: &[Vec<Task>],
    extra: &TagMap,
) -> Option<Vec<(TagMap, Vec<TaskId>)>> {
    let mut builder = StageViewBuilder::new("prop", extra);
    for s in stages {
        builder = builder.parent(s);
    }
    let view = builder.build();
    let out: Vec<NewTask> = rel.generate(&view).ok()?.collect();
    Some(out.into_iter().map(|t| (t.tags, ids(&t.dependencies))).collect())
}

fn product_len(splits: &[Split]) -> usize {
    splits.iter().map(|s| s.values.len()).product()
}

fn all_tasks(stages: &[Vec<Task>]) -> Vec<&Task> {
    stages.iter().flatten().collect()
}

fn distinct_keys(stages: &[Vec<Task>], keywords: &[&str]) -> usize {
    let keys: HashSet<Vec<TagValue>> = all_tasks(stages)
        .into_iter()
        .filter(|t| keywords.iter().all(|k| t.tags().contains_key(*k)))
        .map(|t| keywords.iter().map(|k| t.tags()[*k].clone()).collect())
        .collect();
    keys.len()
}

proptest! {
    #[test]
    fn one_to_one_maps_each_parent_once(raw in parent_stages_strategy(), extra in extra_tags_strategy()) {
        let stages = to_stages(raw);
        let out = run(&Relationship::one_to_one(), &stages, &extra).unwrap();
        let parents = all_tasks(&stages);

        prop_assert_eq!(out.len(), parents.len());
        for ((tags, deps), parent) in out.iter().zip(&parents) {
            prop_assert_eq!(deps, &vec![parent.id()]);
            for (k, v) in extra.iter() {
                prop_assert_eq!(&tags[k], v);
            }
        }
    }

    #[test]
    fn many_to_one_groups_by_distinct_keyword_values(raw in parent_stages_strategy()) {
        let stages = to_stages(raw);
        let rel = Relationship::many_to_one(["sample", "lane"]).unwrap();
        let distinct = distinct_keys(&stages, &["sample", "lane"]);

        match run(&rel, &stages, &TagMap::new()) {
            None => {
                prop_assert_eq!(distinct, 0);
            }
            Some(out) => {
                prop_assert_eq!(out.len(), distinct);

                let incomplete: Vec<TaskId> = all_tasks(&stages)
                    .into_iter()
                    .filter(|t| !(t.tags().contains_key("sample") && t.tags().contains_key("lane")))
                    .map(|t| t.id())
                    .collect();

                let mut complete_seen = Vec::new();
                for (tags, deps) in &out {
                    prop_assert_eq!(tags.len(), 2);
                    let n = deps.len() - incomplete.len();
                    prop_assert_eq!(&deps[n..], incomplete.as_slice());
                    complete_seen.extend_from_slice(&deps[..n]);
                }
                complete_seen.sort();
                let expected_complete = all_tasks(&stages).len() - incomplete.len();
                prop_assert_eq!(complete_seen.len(), expected_complete);
                complete_seen.dedup();
                prop_assert_eq!(complete_seen.len(), expected_complete);
            }
        }
    }

    #[test]
    fn one_to_many_multiplies_by_product(
        raw in parent_stages_strategy(),
        splits in splits_strategy(),
        extra in extra_tags_strategy(),
    ) {
        let stages = to_stages(raw);
        let parents = all_tasks(&stages);
        let rel = Relationship::one_to_many(splits.clone()).unwrap();
        let out = run(&rel, &stages, &extra).unwrap();
        let per_parent = product_len(&splits);

        prop_assert_eq!(out.len(), parents.len() * per_parent);
        for (i, (tags, deps)) in out.iter().enumerate() {
            let parent = parents[i / per_parent];
            prop_assert_eq!(deps, &vec![parent.id()]);
            for (k, v) in parent.tags() {
                if !extra.contains_key(k) {
                    prop_assert_eq!(&tags[k], v);
                }
            }
            for (k, v) in extra.iter() {
                prop_assert_eq!(&tags[k], v);
            }
        }
    }

    #[test]
    fn many_to_many_shares_group_dependencies(raw in parent_stages_strategy(), splits in splits_strategy()) {
        let stages = to_stages(raw);
        let reduce_only = run(&Relationship::many_to_one(["sample"]).unwrap(), &stages, &TagMap::new());
        let both = run(
            &Relationship::many_to_many(["sample"], splits.clone()).unwrap(),
            &stages,
            &TagMap::new(),
        );

        match (reduce_only, both) {
            (None, None) => {}
            (Some(groups), Some(out)) => {
                let per_group = product_len(&splits);
                prop_assert_eq!(out.len(), groups.len() * per_group);
                for (i, (tags, deps)) in out.iter().enumerate() {
                    let (key, group_deps) = &groups[i / per_group];
                    prop_assert_eq!(deps, group_deps);
                    prop_assert_eq!(&tags["sample"], &key["sample"]);
                }
            }
            _ => {
                prop_assert!(false, "many2one and many2many disagree on failure");
            }
        }
    }

    #[test]
    fn generate_is_idempotent(raw in parent_stages_strategy(), splits in splits_strategy()) {
        let stages = to_stages(raw);
        let rel = Relationship::many_to_many(["chrom"], splits).unwrap();

        prop_assert_eq!(
            run(&rel, &stages, &TagMap::new()),
            run(&rel, &stages, &TagMap::new())
        );
    }
}
