#![allow(dead_code)]

use dagmake::dag::DependencyGraph;
use dagmake::spec::{CompiledSpec, Rule, Spec};

pub use dagmake_test_utils::{
    FailingAction, Recorder, Sandbox, SleepingAction, SpecTomlBuilder, init_tracing, rule,
    with_timeout,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Graph with the given `(from, to)` edges; every `from` is declared first.
pub fn graph_with_edges(root: &std::path::Path, edges: &[(&str, &str)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new(root);
    for (from, _) in edges {
        if graph.lookup(from).is_none_or(|n| !n.is_declared()) {
            graph.add_path(from, &[]).unwrap();
        }
    }
    for (from, to) in edges {
        graph.add_dependency(from, to).unwrap();
    }
    graph
}

/// Compile a programmatic spec of `rules` rooted at the sandbox.
pub fn compile(sandbox: &Sandbox, rules: Vec<Rule>) -> CompiledSpec {
    let mut spec = Spec::new(sandbox.root());
    for rule in rules {
        spec.add_rule(rule);
    }
    spec.compile().expect("spec compiles")
}
