// tests/executor_scenarios.rs

mod common;
use crate::common::{
    FailingAction, Recorder, Sandbox, SleepingAction, compile, init_tracing, rule, with_timeout,
};

use std::time::Duration;

use dagmake::errors::DagmakeError;
use dagmake::exec::{Executor, Interrupt};
use dagmake::spec::{Outputs, Rule};
use dagmake::types::{BuildMode, ExecutorState};

fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn builds_missing_target_from_existing_input() {
    init_tracing();
    let sandbox = Sandbox::new();
    sandbox.write("input.txt", "in");
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![rule("target.txt", &["input.txt"], recorder.action("copy"))],
    );

    let mut executor = Executor::for_compiled(&compiled);
    assert_eq!(executor.state(), ExecutorState::Idle);

    let plan = executor
        .plan(&targets(&["target.txt"]), sandbox.root(), BuildMode::Normal)
        .unwrap();
    assert_eq!(plan.paths(), vec![sandbox.path("target.txt").as_path()]);
    assert_eq!(executor.state(), ExecutorState::Planning);

    let summary = executor.run(&plan).await.unwrap();
    assert!(sandbox.exists("target.txt"));
    assert_eq!(summary.executed, vec![sandbox.path("target.txt")]);
    assert_eq!(executor.state(), ExecutorState::Done);

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ctx.inputs, vec![sandbox.path("input.txt")]);
    assert_eq!(calls[0].ctx.outputs, vec![sandbox.path("target.txt")]);
    assert_eq!(calls[0].ctx.working_dir, sandbox.root());
}

#[tokio::test]
async fn touched_leaf_rebuilds_intermediate_before_target() {
    let sandbox = Sandbox::new();
    for name in ["A", "B", "C"] {
        sandbox.write(name, name);
    }
    sandbox.age("A", 300);
    sandbox.age("B", 200);
    sandbox.age("C", 10);

    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("B", &["C"], recorder.action("make-B")),
            rule("A", &["B"], recorder.action("make-A")),
        ],
    );

    let mut executor = Executor::for_compiled(&compiled);
    let summary = executor
        .build(&targets(&["A"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();

    assert_eq!(recorder.names(), vec!["make-B", "make-A"]);
    assert_eq!(summary.executed, vec![sandbox.path("B"), sandbox.path("A")]);
    // C has no builder.
    assert_eq!(summary.skipped, vec![sandbox.path("C")]);
}

#[tokio::test]
async fn missing_declared_output_is_build_incomplete() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![Rule::new(
            Outputs::Literal(vec!["made".to_string(), "never".to_string()]),
            recorder.action_skipping("pair", "never"),
        )],
    );

    let mut executor = Executor::for_compiled(&compiled);
    let err = executor
        .build(&targets(&["made"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap_err();

    match err {
        DagmakeError::BuildIncomplete { node, path } => {
            assert_eq!(node, "made");
            assert_eq!(path, sandbox.path("never"));
        }
        other => panic!("expected BuildIncomplete, got {other:?}"),
    }
    assert_eq!(executor.state(), ExecutorState::Failed);
    assert!(sandbox.exists("made"));
}

#[tokio::test]
async fn second_build_is_up_to_date() {
    let sandbox = Sandbox::new();
    sandbox.write("input.txt", "in");
    sandbox.age("input.txt", 100);
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![rule("target.txt", &["input.txt"], recorder.action("copy"))],
    );

    Executor::for_compiled(&compiled)
        .build(&targets(&["target.txt"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();

    let summary = Executor::for_compiled(&compiled)
        .build(&targets(&["target.txt"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();

    assert!(summary.executed.is_empty());
    assert_eq!(summary.up_to_date, vec![sandbox.path("target.txt")]);
    assert_eq!(recorder.calls().len(), 1);
}

#[tokio::test]
async fn force_rebuilds_the_whole_closure() {
    let sandbox = Sandbox::new();
    sandbox.write("seed", "s");
    sandbox.write("mid", "m");
    sandbox.write("top", "t");
    sandbox.age("seed", 300);
    sandbox.age("mid", 200);

    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("mid", &["seed"], recorder.action("mid")),
            rule("top", &["mid"], recorder.action("top")),
        ],
    );

    let normal = Executor::for_compiled(&compiled)
        .build(&targets(&["top"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();
    assert!(normal.executed.is_empty());

    let forced = Executor::for_compiled(&compiled)
        .build(&targets(&["top"]), sandbox.root(), BuildMode::Force)
        .await
        .unwrap();
    assert_eq!(recorder.names(), vec!["mid", "top"]);
    assert_eq!(forced.mode, BuildMode::Force);
}

#[tokio::test]
async fn builder_with_several_planned_outputs_runs_once() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![Rule::new(
            Outputs::Literal(vec!["x".to_string(), "y".to_string()]),
            recorder.action("pair"),
        )],
    );

    let mut executor = Executor::for_compiled(&compiled);
    let plan = executor
        .plan(&targets(&["x", "y"]), sandbox.root(), BuildMode::Normal)
        .unwrap();
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.skipped, vec![sandbox.path("y")]);

    executor.run(&plan).await.unwrap();
    assert_eq!(recorder.calls().len(), 1);
    assert!(sandbox.exists("x") && sandbox.exists("y"));
}

#[tokio::test]
async fn clean_removes_declared_outputs_only() {
    let sandbox = Sandbox::new();
    sandbox.write("src.txt", "source");
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("gen/mid.txt", &["src.txt"], recorder.action("mid")),
            rule("gen/top.txt", &["gen/mid.txt"], recorder.action("top")),
        ],
    );

    Executor::for_compiled(&compiled)
        .build(&targets(&["gen/top.txt"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();
    sandbox.write("gen/notes.txt", "undeclared");

    let summary = Executor::for_compiled(&compiled)
        .build(&targets(&["gen/top.txt"]), sandbox.root(), BuildMode::Clean)
        .await
        .unwrap();

    assert!(!sandbox.exists("gen/mid.txt"));
    assert!(!sandbox.exists("gen/top.txt"));
    assert!(sandbox.exists("gen/notes.txt"));
    assert!(sandbox.exists("src.txt"));
    assert_eq!(summary.executed.len(), 2);
    assert_eq!(recorder.calls().len(), 2);

    // Cleaning again is not an error.
    Executor::for_compiled(&compiled)
        .build(&targets(&["gen/top.txt"]), sandbox.root(), BuildMode::Clean)
        .await
        .unwrap();
}

#[tokio::test]
async fn clean_keeps_undeclared_files_inside_output_directories() {
    let sandbox = Sandbox::new();
    sandbox.write("src.txt", "src");
    sandbox.write("dist/README.keep", "hand written");
    sandbox.mkdir("stage");
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("dist", &["src.txt"], recorder.action("dist")),
            rule("stage", &["src.txt"], recorder.action("stage")),
        ],
    );

    Executor::for_compiled(&compiled)
        .build(&targets(&["dist", "stage"]), sandbox.root(), BuildMode::Clean)
        .await
        .unwrap();

    assert!(sandbox.exists("dist/README.keep"));
    assert!(!sandbox.exists("stage"));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn output_directories_are_created() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![rule("deep/nested/out.txt", &[], recorder.action("deep"))],
    );

    Executor::for_compiled(&compiled)
        .build(&targets(&["deep/nested/out.txt"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();
    assert!(sandbox.exists("deep/nested/out.txt"));
}

#[tokio::test]
async fn glob_targets_match_graph_nodes() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("out/a.txt", &[], recorder.action("a")),
            rule("out/b.txt", &[], recorder.action("b")),
            rule("other.txt", &[], recorder.action("other")),
        ],
    );

    Executor::for_compiled(&compiled)
        .build(&targets(&["out/*.txt"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();

    assert_eq!(recorder.names(), vec!["a", "b"]);
    assert!(!sandbox.exists("other.txt"));
}

#[tokio::test]
async fn glob_targets_work_below_a_directory_with_glob_characters() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("proj{old}/out/a.txt", &[], recorder.action("a")),
            rule("proj{old}/other.txt", &[], recorder.action("other")),
        ],
    );

    Executor::for_compiled(&compiled)
        .build(&targets(&["out/*.txt"]), &sandbox.path("proj{old}"), BuildMode::Normal)
        .await
        .unwrap();

    assert_eq!(recorder.names(), vec!["a"]);
}

#[tokio::test]
async fn targets_resolve_relative_to_the_working_directory() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(&sandbox, vec![rule("sub/x", &[], recorder.action("x"))]);

    Executor::for_compiled(&compiled)
        .build(&targets(&["x"]), &sandbox.path("sub"), BuildMode::Normal)
        .await
        .unwrap();
    assert!(sandbox.exists("sub/x"));
}

#[tokio::test]
async fn unknown_target_fails_at_plan_time() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(&sandbox, vec![rule("x", &[], recorder.action("x"))]);

    let mut executor = Executor::for_compiled(&compiled);
    for request in ["nope", "nope/*.txt"] {
        let err = executor
            .plan(&targets(&[request]), sandbox.root(), BuildMode::Normal)
            .unwrap_err();
        match err {
            DagmakeError::NoSuchTarget(name) => assert_eq!(name, request),
            other => panic!("expected NoSuchTarget, got {other:?}"),
        }
        assert_eq!(executor.state(), ExecutorState::Failed);
    }
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn failing_action_is_a_runtime_error_and_stops_the_plan() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("first", &[], FailingAction::new("compiler exploded")),
            rule("second", &["first"], recorder.action("second")),
        ],
    );

    let err = Executor::for_compiled(&compiled)
        .build(&targets(&["second"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap_err();

    match &err {
        DagmakeError::Runtime { node, message } => {
            assert_eq!(node, "first");
            assert!(message.contains("compiler exploded"));
        }
        other => panic!("expected Runtime, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn interrupt_during_action_stops_the_build() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![
            rule("slow", &[], SleepingAction::new(Duration::from_secs(30))),
            rule("after", &["slow"], recorder.action("after")),
        ],
    );

    let (handle, interrupt) = Interrupt::new();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.trigger();
    });

    let mut executor = Executor::for_compiled(&compiled).with_interrupt(interrupt);
    let err = with_timeout(executor.build(&targets(&["after"]), sandbox.root(), BuildMode::Normal))
        .await
        .unwrap_err();

    match &err {
        DagmakeError::Interrupted { node } => assert_eq!(node, "slow"),
        other => panic!("expected Interrupted, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 1);
    assert_eq!(executor.state(), ExecutorState::Failed);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn interrupt_before_start_runs_nothing() {
    let sandbox = Sandbox::new();
    let recorder = Recorder::new();
    let compiled = compile(&sandbox, vec![rule("x", &[], recorder.action("x"))]);

    let (handle, interrupt) = Interrupt::new();
    handle.trigger();

    let err = Executor::for_compiled(&compiled)
        .with_interrupt(interrupt)
        .build(&targets(&["x"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap_err();
    assert!(matches!(err, DagmakeError::Interrupted { .. }));
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn execute_without_builder_is_skipped() {
    let sandbox = Sandbox::new();
    sandbox.write("input.txt", "in");
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![rule("target.txt", &["input.txt"], recorder.action("copy"))],
    );

    let executor = Executor::for_compiled(&compiled);
    let ran = executor
        .execute(&sandbox.path("input.txt"), BuildMode::Normal)
        .await
        .unwrap();
    assert!(!ran);
    assert!(recorder.calls().is_empty());
}

#[tokio::test]
async fn change_tracking_never_fails_the_build() {
    let sandbox = Sandbox::new();
    sandbox.write("input.txt", "in");
    let recorder = Recorder::new();
    let compiled = compile(
        &sandbox,
        vec![rule("target.txt", &["input.txt"], recorder.action("copy"))],
    );

    let summary = Executor::for_compiled(&compiled)
        .with_change_tracking(true)
        .build(&targets(&["target.txt"]), sandbox.root(), BuildMode::Normal)
        .await
        .unwrap();
    assert_eq!(summary.executed, vec![sandbox.path("target.txt")]);
}
