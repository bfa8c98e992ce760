// tests/discovery.rs

mod common;
use crate::common::{Sandbox, SpecTomlBuilder, init_tracing};

use dagmake::discovery::{Discovery, SpecLocator, find_all_specs};
use dagmake::errors::DagmakeError;
use dagmake::spec::SPEC_FILE_NAME;

fn spec_path(dir: &str) -> String {
    format!("{dir}/{SPEC_FILE_NAME}")
}

#[test]
fn governing_spec_is_nearest_ancestor() {
    let sandbox = Sandbox::new();
    sandbox.write(SPEC_FILE_NAME, "");
    sandbox.write(&spec_path("lib"), "");

    let mut locator = SpecLocator::new();
    let found = locator
        .find_governing_spec(&sandbox.path("lib/src/deep/file.c"))
        .unwrap();
    assert_eq!(found, Some(sandbox.path(&spec_path("lib"))));

    let found = locator
        .find_governing_spec(&sandbox.path("app/main.c"))
        .unwrap();
    assert_eq!(found, Some(sandbox.path(SPEC_FILE_NAME)));
}

#[test]
fn governing_spec_lookups_are_memoized_per_directory() {
    let sandbox = Sandbox::new();
    sandbox.write(&spec_path("lib"), "");

    let mut locator = SpecLocator::new();
    locator
        .find_governing_spec(&sandbox.path("lib/a/b/c.txt"))
        .unwrap();
    let cached = locator.cached_dirs();
    assert!(cached >= 3, "expected lookups to be cached, got {cached}");

    // A sibling below an already-scanned directory only adds its own entries.
    let found = locator
        .find_governing_spec(&sandbox.path("lib/a/other.txt"))
        .unwrap();
    assert_eq!(found, Some(sandbox.path(&spec_path("lib"))));
    assert_eq!(locator.cached_dirs(), cached + 1);
}

#[test]
fn no_governing_spec_returns_none() {
    let sandbox = Sandbox::new();
    let mut discovery = Discovery::new();
    let found = discovery
        .find_governing_spec(&sandbox.path("a/b.txt"))
        .unwrap();
    // The tempdir's ancestors are not expected to hold a spec file.
    assert!(found.is_none_or(|f| !f.starts_with(sandbox.root())));
}

#[test]
fn sibling_spec_is_discovered_and_merged() {
    init_tracing();
    let sandbox = Sandbox::new();
    sandbox.write("lib/src.txt", "source");
    sandbox.write(
        &spec_path("app"),
        &SpecTomlBuilder::new()
            .rule(&["app.txt"], &["../lib/lib.txt"], "cp {in} {out}")
            .build(),
    );
    let lib_spec = sandbox.write(
        &spec_path("lib"),
        &SpecTomlBuilder::new()
            .rule(&["lib.txt"], &["src.txt"], "cp {in} {out}")
            .build(),
    );

    let mut discovery = Discovery::new();
    let mut spec = discovery.read_spec(&sandbox.path(&spec_path("app"))).unwrap();
    let compiled = discovery.read_graph(&mut spec).unwrap();

    let lib = compiled.graph.get(&sandbox.path("lib/lib.txt")).unwrap();
    assert!(lib.is_declared());
    assert_eq!(lib.owning_root(), sandbox.path("lib"));
    assert!(compiled.builder_for(lib.path()).is_some());
    assert_eq!(compiled.graph.root_path(), sandbox.root());

    assert_eq!(spec.merged_files(), &[lib_spec]);
    assert_eq!(spec.rules().len(), 2);
    assert!(compiled.graph.missing_dependencies().is_empty());
}

#[test]
fn chained_directories_resolve_depth_first() {
    let sandbox = Sandbox::new();
    sandbox.write("c/seed", "s");
    sandbox.write(
        &spec_path("a"),
        &SpecTomlBuilder::new().rule(&["a.out"], &["../b/b.out"], "x").build(),
    );
    sandbox.write(
        &spec_path("b"),
        &SpecTomlBuilder::new().rule(&["b.out"], &["../c/c.out"], "x").build(),
    );
    sandbox.write(
        &spec_path("c"),
        &SpecTomlBuilder::new().rule(&["c.out"], &["seed"], "x").build(),
    );

    let mut discovery = Discovery::new();
    let mut spec = discovery.read_spec(&sandbox.path(&spec_path("a"))).unwrap();
    let compiled = discovery.read_graph(&mut spec).unwrap();

    for out in ["a/a.out", "b/b.out", "c/c.out"] {
        assert!(compiled.graph.get(&sandbox.path(out)).unwrap().is_declared(), "{out}");
    }
    assert_eq!(spec.merged_files().len(), 2);
}

#[test]
fn mutually_referencing_directories_terminate() {
    let sandbox = Sandbox::new();
    sandbox.write("a/src", "s");
    sandbox.write(
        &spec_path("a"),
        &SpecTomlBuilder::new()
            .rule(&["a1"], &["../b/b1"], "x")
            .rule(&["a2"], &["src"], "x")
            .build(),
    );
    sandbox.write(
        &spec_path("b"),
        &SpecTomlBuilder::new().rule(&["b1"], &["../a/a2"], "x").build(),
    );

    let mut discovery = Discovery::new();
    let mut spec = discovery.read_spec(&sandbox.path(&spec_path("a"))).unwrap();
    let compiled = discovery.read_graph(&mut spec).unwrap();

    assert!(compiled.graph.get(&sandbox.path("b/b1")).unwrap().is_declared());
    assert!(compiled.graph.get(&sandbox.path("a/a2")).unwrap().is_declared());
    assert_eq!(spec.merged_files().len(), 1);
}

#[test]
fn cycle_across_specs_is_reported_before_execution() {
    let sandbox = Sandbox::new();
    sandbox.write(
        &spec_path("a"),
        &SpecTomlBuilder::new().rule(&["x"], &["../b/y"], "x").build(),
    );
    sandbox.write(
        &spec_path("b"),
        &SpecTomlBuilder::new().rule(&["y"], &["../a/x"], "x").build(),
    );

    let mut discovery = Discovery::new();
    let mut spec = discovery.read_spec(&sandbox.path(&spec_path("a"))).unwrap();
    let err = discovery.read_graph(&mut spec).unwrap_err();
    assert!(err.is_cyclic(), "got {err:?}");
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn missing_dependencies_are_reported_together() {
    let sandbox = Sandbox::new();
    sandbox.write("present", "p");
    sandbox.write(
        SPEC_FILE_NAME,
        &SpecTomlBuilder::new()
            .rule(&["out"], &["present", "missing-one", "missing-two"], "x")
            .build(),
    );

    let mut discovery = Discovery::new();
    let mut spec = discovery.read_spec(&sandbox.path(SPEC_FILE_NAME)).unwrap();
    let err = discovery.read_graph(&mut spec).unwrap_err();

    match err {
        DagmakeError::MissingDependencies(paths) => {
            assert_eq!(paths, vec!["missing-one", "missing-two"]);
        }
        other => panic!("expected MissingDependencies, got {other:?}"),
    }
}

#[test]
fn find_all_specs_walks_down_and_up() {
    let sandbox = Sandbox::new();
    sandbox.write(SPEC_FILE_NAME, "");
    sandbox.write(&spec_path("sub"), "");
    sandbox.write(&spec_path("sub/deeper"), "");
    sandbox.write(&spec_path("sub/.hidden"), "");
    sandbox.write(&spec_path("sub/target"), "");
    sandbox.write(&spec_path("elsewhere"), "");

    let found = find_all_specs(&sandbox.path("sub")).unwrap();
    let inside: Vec<_> = found
        .into_iter()
        .filter(|p| p.starts_with(sandbox.root()))
        .collect();

    assert_eq!(
        inside,
        vec![
            sandbox.path(SPEC_FILE_NAME),
            sandbox.path(&spec_path("sub")),
            sandbox.path(&spec_path("sub/deeper")),
        ]
    );
}
