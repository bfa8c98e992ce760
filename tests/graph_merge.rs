// tests/graph_merge.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use dagmake::dag::DependencyGraph;

fn paths(graph: &DependencyGraph) -> BTreeSet<PathBuf> {
    graph.nodes().map(|n| n.path().to_path_buf()).collect()
}

#[test]
fn merge_unions_nodes_and_reroots_at_common_ancestor() {
    let mut a = DependencyGraph::new("/p/app");
    a.add_path("bin/app", &[]).unwrap();
    a.add_dependency("bin/app", "../lib/out/lib.a").unwrap();

    let mut b = DependencyGraph::new("/p/lib");
    b.add_path("out/lib.a", &[]).unwrap();
    b.add_dependency("out/lib.a", "src/lib.c").unwrap();

    let expected: BTreeSet<PathBuf> = paths(&a).union(&paths(&b)).cloned().collect();

    a.merge(b);

    assert_eq!(a.root_path(), Path::new("/p"));
    assert_eq!(paths(&a), expected);
}

#[test]
fn declared_node_beats_dependency_only_node() {
    let mut a = DependencyGraph::new("/p/app");
    a.add_path("bin/app", &[]).unwrap();
    a.add_dependency("bin/app", "../lib/out/lib.a").unwrap();
    assert!(!a.get(Path::new("/p/lib/out/lib.a")).unwrap().is_declared());

    let mut b = DependencyGraph::new("/p/lib");
    b.add_path("out/lib.a", &["lib".to_string()]).unwrap();
    b.add_dependency("out/lib.a", "src/lib.c").unwrap();

    a.merge(b);

    let lib = a.get(Path::new("/p/lib/out/lib.a")).unwrap();
    assert!(lib.is_declared());
    assert_eq!(lib.owning_root(), Path::new("/p/lib"));
    assert_eq!(lib.dependencies(), &[PathBuf::from("/p/lib/src/lib.c")]);
    assert!(a.undeclared_dependencies().iter().all(|n| n.path() != lib.path()));
}

#[test]
fn dependency_only_node_does_not_replace_declared_one() {
    let mut a = DependencyGraph::new("/p/lib");
    a.add_path("out/lib.a", &[]).unwrap();
    a.add_dependency("out/lib.a", "src/lib.c").unwrap();

    let mut b = DependencyGraph::new("/p/app");
    b.add_path("bin/app", &[]).unwrap();
    b.add_dependency("bin/app", "../lib/out/lib.a").unwrap();

    a.merge(b);

    let lib = a.get(Path::new("/p/lib/out/lib.a")).unwrap();
    assert!(lib.is_declared());
    assert_eq!(lib.dependencies().len(), 1);
}

#[test]
fn conflicting_declarations_keep_the_incoming_node() {
    let mut a = DependencyGraph::new("/p");
    a.add_path("shared/out.txt", &["first".to_string()]).unwrap();

    let mut b = DependencyGraph::new("/p/shared");
    b.add_path("out.txt", &["second".to_string()]).unwrap();

    a.merge(b);

    let node = a.get(Path::new("/p/shared/out.txt")).unwrap();
    assert!(node.tags().contains("second"));
    assert!(!node.tags().contains("first"));
    assert_eq!(a.root_path(), Path::new("/p"));
}

#[test]
fn merging_identical_roots_keeps_root() {
    let mut a = DependencyGraph::new("/p");
    a.add_path("x", &[]).unwrap();
    let mut b = DependencyGraph::new("/p");
    b.add_path("y", &[]).unwrap();

    a.merge(b);
    assert_eq!(a.root_path(), Path::new("/p"));
    assert_eq!(a.len(), 2);
}

#[test]
fn merge_can_introduce_a_cycle_that_ensure_acyclic_reports() {
    let mut a = DependencyGraph::new("/p/a");
    a.add_path("out", &[]).unwrap();
    a.add_dependency("out", "../b/out").unwrap();

    let mut b = DependencyGraph::new("/p/b");
    b.add_path("out", &[]).unwrap();
    b.add_dependency("out", "../a/out").unwrap();

    a.merge(b);

    let err = a.ensure_acyclic().unwrap_err();
    assert!(err.is_cyclic());
}
