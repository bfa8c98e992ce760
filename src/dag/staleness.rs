// src/dag/staleness.rs

//! Transitive dependency collection and timestamp-based staleness.
//!
//! Every dependency in a target's closure is compared against the target's
//! own output timestamp, not against its immediate parent. This is sound as
//! long as builds complete bottom-up, which the executor guarantees.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;

use crate::dag::graph::DependencyGraph;
use crate::dag::node::Node;
use crate::errors::{DagmakeError, Result};

/// Every dependency reachable from `node`, deepest first.
///
/// A node's own dependencies are emitted before the node itself, so the
/// returned order is a valid build order. Shared dependencies may appear more
/// than once; callers de-duplicate. Fails if a cycle is encountered during
/// traversal.
pub fn transitive_dependencies<'g>(graph: &'g DependencyGraph, node: &Node) -> Result<Vec<&'g Node>> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    collect(graph, node.path(), &mut stack, &mut out)?;
    Ok(out)
}

fn collect<'g>(
    graph: &'g DependencyGraph,
    path: &Path,
    stack: &mut Vec<PathBuf>,
    out: &mut Vec<&'g Node>,
) -> Result<()> {
    if stack.iter().any(|p| p == path) {
        let mut chain = stack.clone();
        chain.push(path.to_path_buf());
        return Err(DagmakeError::CyclicDependency {
            path: path.to_path_buf(),
            chain,
        });
    }

    // Resolve through the graph so merged-in declarations are used.
    let Some(node) = graph.get(path) else {
        return Ok(());
    };

    stack.push(path.to_path_buf());
    for dep in node.dependencies() {
        collect(graph, dep, stack, out)?;
        if let Some(dep_node) = graph.get(dep) {
            out.push(dep_node);
        }
    }
    stack.pop();
    Ok(())
}

/// The part of `target`'s closure that must be rebuilt.
///
/// If the target's output does not exist, the whole closure is returned.
/// Otherwise every dependency whose file is missing or strictly newer than
/// the target is selected.
pub fn requires_build<'g>(graph: &'g DependencyGraph, target: &Node) -> Result<Vec<&'g Node>> {
    let closure = transitive_dependencies(graph, target)?;

    let Some(target_mtime) = modified_time(target.path()) else {
        trace!(target = %target.path().display(), "target missing; whole closure is stale");
        return Ok(closure);
    };

    Ok(closure
        .into_iter()
        .filter(|dep| match modified_time(dep.path()) {
            Some(dep_mtime) => dep_mtime > target_mtime,
            None => true,
        })
        .collect())
}

/// Modification time of `path`, or `None` if it does not exist.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
