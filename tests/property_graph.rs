// tests/property_graph.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

use dagmake::dag::{DependencyGraph, transitive_dependencies};
use proptest::prelude::*;

const NODES: usize = 8;

fn name(i: usize) -> String {
    format!("n{i}")
}

// Arbitrary edge requests between a fixed set of declared nodes; many of them
// close cycles or repeat earlier edges.
fn edges_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
    proptest::collection::vec((0..NODES, 0..NODES), 0..40)
}

fn snapshot(graph: &DependencyGraph) -> Vec<(PathBuf, Vec<PathBuf>)> {
    graph
        .nodes()
        .map(|n| (n.path().to_path_buf(), n.dependencies().to_vec()))
        .collect()
}

proptest! {
    #[test]
    fn graph_stays_acyclic_under_arbitrary_edges(edges in edges_strategy()) {
        let mut graph = DependencyGraph::new("/p");
        for i in 0..NODES {
            graph.add_path(name(i), &[]).unwrap();
        }

        for (from, to) in edges {
            let before = snapshot(&graph);
            match graph.add_dependency(name(from), name(to)) {
                Ok(_) => prop_assert!(from != to),
                Err(e) => {
                    prop_assert!(e.is_cyclic());
                    prop_assert_eq!(snapshot(&graph), before);
                }
            }
        }

        prop_assert!(graph.ensure_acyclic().is_ok());

        for node in graph.nodes() {
            let closure = transitive_dependencies(&graph, node).unwrap();
            prop_assert!(closure.iter().all(|dep| dep.path() != node.path()));

            let unique: BTreeSet<_> = node.dependencies().iter().collect();
            prop_assert_eq!(unique.len(), node.dependencies().len());
        }
    }

    #[test]
    fn merge_is_a_path_union_rooted_above_both(
        left in proptest::collection::vec(0..NODES, 1..6),
        right in proptest::collection::vec(0..NODES, 1..6),
    ) {
        let mut a = DependencyGraph::new("/p/a");
        for i in &left {
            a.add_path(name(*i), &[]).unwrap();
        }
        let mut b = DependencyGraph::new("/p/b/c");
        for i in &right {
            b.add_path(name(*i), &[]).unwrap();
        }

        let mut expected: BTreeSet<PathBuf> = a.nodes().map(|n| n.path().to_path_buf()).collect();
        expected.extend(b.nodes().map(|n| n.path().to_path_buf()));

        a.merge(b);

        let actual: BTreeSet<PathBuf> = a.nodes().map(|n| n.path().to_path_buf()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(a.root_path(), std::path::Path::new("/p"));
    }
}
