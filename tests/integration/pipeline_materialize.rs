// tests/integration/pipeline_materialize.rs

use kosmos::errors::{KosmosError, Result};
use kosmos::pipeline::{DefaultTaskFactory, Pipeline, Stage, StageSpec, Task, TaskFactory};
use kosmos::rel::{Relationship, Split};
use kosmos::types::{TagMap, TaskId};
use kosmos_test_utils::builders::{tags, tid};
use kosmos_test_utils::factories::{FailingTaskFactory, RecordingTaskFactory};
use kosmos_test_utils::init_tracing;

fn sample_pipeline() -> Pipeline {
    let mut p = Pipeline::new();
    p.add_source(
        "input",
        vec![
            tags(&[("sample", "a"), ("chunk", "1")]),
            tags(&[("sample", "a"), ("chunk", "2")]),
            tags(&[("sample", "b"), ("chunk", "1")]),
        ],
    )
    .unwrap();
    p.add_stage(
        StageSpec::new("align", Relationship::one_to_one())
            .parent("input")
            .extra_tags(tags(&[("tool", "bwa")])),
    )
    .unwrap();
    p.add_stage(
        StageSpec::new("merge", Relationship::many_to_one(["sample"]).unwrap()).parent("align"),
    )
    .unwrap();
    p.add_stage(
        StageSpec::new(
            "call",
            Relationship::one_to_many(vec![Split::new("chrom", ["1", "2"])]).unwrap(),
        )
        .parent("merge"),
    )
    .unwrap();
    p
}

#[test]
fn materialize_all_builds_tasks_and_edges() {
    init_tracing();

    let mut p = sample_pipeline();
    p.materialize_all(&mut DefaultTaskFactory).unwrap();

    let align = p.stage_by_name("align").unwrap();
    assert_eq!(align.tasks().len(), 3);
    assert_eq!(
        align.tasks()[0].tags(),
        &tags(&[("sample", "a"), ("chunk", "1"), ("tool", "bwa")])
    );
    assert_eq!(align.tasks()[2].parents(), &[tid(0, 2)]);

    let merge = p.stage_by_name("merge").unwrap();
    assert_eq!(merge.tasks().len(), 2);
    assert_eq!(merge.tasks()[0].parents(), &[tid(1, 0), tid(1, 1)]);
    assert_eq!(merge.tasks()[1].parents(), &[tid(1, 2)]);

    let call = p.stage_by_name("call").unwrap();
    assert_eq!(call.tasks().len(), 4);
    assert_eq!(
        call.tasks()[3].tags(),
        &tags(&[("chrom", "2"), ("sample", "b")])
    );
    assert_eq!(call.tasks()[3].parents(), &[tid(2, 1)]);

    let deps = p.dependencies_of(tid(2, 0));
    assert_eq!(deps.len(), 2);
    assert_eq!(deps[1].tags()["chunk"].to_string(), "2");
}

#[test]
fn materialize_requires_parents_first() {
    let mut p = sample_pipeline();
    let merge = p.stage_id("merge").unwrap();

    match p.materialize(merge, &mut DefaultTaskFactory) {
        Err(KosmosError::ParentNotMaterialized { stage, parent }) => {
            assert_eq!(stage, "merge");
            assert_eq!(parent, "align");
        }
        other => panic!("expected ParentNotMaterialized, got: {other:?}"),
    }
    assert!(!p.stage(merge).unwrap().is_materialized());
}

#[test]
fn materialize_twice_does_not_recreate_tasks() {
    let mut p = sample_pipeline();
    let mut factory = RecordingTaskFactory::new();

    p.materialize_all(&mut factory).unwrap();
    let created = factory.created().len();
    assert_eq!(created, 3 + 3 + 2 + 4);

    let before = p.stage_by_name("call").unwrap().tasks().to_vec();
    p.materialize_all(&mut factory).unwrap();

    assert_eq!(factory.created().len(), created);
    assert_eq!(p.stage_by_name("call").unwrap().tasks(), before.as_slice());
}

#[test]
fn matching_error_leaves_stage_unpopulated() {
    let mut p = Pipeline::new();
    p.add_source("input", vec![tags(&[("sample", "a")])]).unwrap();
    let merge = p
        .add_stage(
            StageSpec::new("merge", Relationship::many_to_one(["lane"]).unwrap()).parent("input"),
        )
        .unwrap();

    let result = p.materialize_all(&mut DefaultTaskFactory);

    assert!(matches!(result, Err(KosmosError::NoMatchingParents { .. })));
    assert!(p.stage_by_name("input").unwrap().is_materialized());
    assert!(!p.stage(merge).unwrap().is_materialized());
    assert!(p.stage(merge).unwrap().tasks().is_empty());
}

#[test]
fn factory_error_leaves_stage_unpopulated() {
    let mut p = sample_pipeline();
    // input (3) + align (3) succeed; the 2nd task of merge fails.
    let mut factory = FailingTaskFactory::new(7);

    let result = p.materialize_all(&mut factory);

    assert!(matches!(result, Err(KosmosError::Other(_))));
    assert!(p.stage_by_name("align").unwrap().is_materialized());
    assert!(!p.stage_by_name("merge").unwrap().is_materialized());
    assert!(!p.stage_by_name("call").unwrap().is_materialized());
}

#[test]
fn stages_can_have_several_parents() {
    let mut p = Pipeline::new();
    p.add_source("reads", vec![tags(&[("sample", "a")]), tags(&[("sample", "b")])])
        .unwrap();
    p.add_source("reference", vec![tags(&[("genome", "hg38")])]).unwrap();
    p.add_stage(
        StageSpec::new("align", Relationship::many_to_one(["sample"]).unwrap())
            .parent("reads")
            .parent("reference"),
    )
    .unwrap();

    p.materialize_all(&mut DefaultTaskFactory).unwrap();

    let align = p.stage_by_name("align").unwrap();
    assert_eq!(align.tasks().len(), 2);
    assert_eq!(align.tasks()[0].parents(), &[tid(0, 0), tid(1, 0)]);
    assert_eq!(align.tasks()[1].parents(), &[tid(0, 1), tid(1, 0)]);
}

#[test]
fn add_stage_rejects_bad_definitions() {
    let mut p = Pipeline::new();
    p.add_source("input", vec![]).unwrap();

    assert!(matches!(
        p.add_source("input", vec![]),
        Err(KosmosError::Config(msg)) if msg.contains("duplicate")
    ));
    assert!(matches!(
        p.add_stage(StageSpec::new("x", Relationship::one_to_one()).parent("missing")),
        Err(KosmosError::Config(msg)) if msg.contains("unknown parent")
    ));
    assert!(matches!(
        p.add_stage(StageSpec::new("y", Relationship::one_to_one())),
        Err(KosmosError::Config(_))
    ));
    assert!(matches!(
        p.add_stage(
            StageSpec::new("z", Relationship::one_to_one())
                .parent("input")
                .parent("input")
        ),
        Err(KosmosError::Config(msg)) if msg.contains("more than once")
    ));
    assert_eq!(p.len(), 1);
}

#[test]
fn unknown_stage_lookups_fail() {
    let p = sample_pipeline();

    assert!(matches!(
        p.stage_id("nope"),
        Err(KosmosError::StageNotFound(name)) if name == "nope"
    ));
    assert!(p.stage_by_name("nope").is_none());
    assert!(p.task(tid(9, 0)).is_none());
}

/// Rewrites what it is given for every derived stage: moves the task to
/// another slot and/or drops its parent edges.
struct RewritingFactory {
    new_index: Option<usize>,
    drop_parents: bool,
}

impl TaskFactory for RewritingFactory {
    fn create_task(
        &mut self,
        stage: &Stage,
        id: TaskId,
        tags: TagMap,
        parents: Vec<TaskId>,
    ) -> Result<Task> {
        if stage.relationship().is_none() {
            return Ok(Task::new(id, tags, parents));
        }
        let id = match self.new_index {
            Some(index) => TaskId { index, ..id },
            None => id,
        };
        let parents = if self.drop_parents { Vec::new() } else { parents };
        Ok(Task::new(id, tags, parents))
    }
}

#[test]
fn factory_cannot_move_a_task_to_another_slot() {
    let mut p = sample_pipeline();
    let mut factory = RewritingFactory {
        new_index: Some(99),
        drop_parents: true,
    };

    match p.materialize_all(&mut factory) {
        Err(KosmosError::FactoryMismatch {
            stage,
            expected,
            got,
            ..
        }) => {
            assert_eq!(stage, "align");
            assert_eq!(expected, tid(1, 0));
            assert_eq!(got, tid(1, 99));
        }
        other => panic!("expected FactoryMismatch, got: {other:?}"),
    }
    assert!(p.stage_by_name("input").unwrap().is_materialized());
    assert!(!p.stage_by_name("align").unwrap().is_materialized());
    assert!(p.task(tid(1, 0)).is_none());
}

#[test]
fn factory_cannot_drop_dependency_edges() {
    let mut p = sample_pipeline();
    let mut factory = RewritingFactory {
        new_index: None,
        drop_parents: true,
    };

    match p.materialize_all(&mut factory) {
        Err(KosmosError::FactoryMismatch { reason, .. }) => {
            assert!(reason.contains("parent edges"));
        }
        other => panic!("expected FactoryMismatch, got: {other:?}"),
    }
    assert!(!p.stage_by_name("align").unwrap().is_materialized());

    // A well-behaved factory still materializes the rest afterwards.
    p.materialize_all(&mut DefaultTaskFactory).unwrap();
    assert_eq!(p.dependencies_of(tid(1, 0)).len(), 1);
}
