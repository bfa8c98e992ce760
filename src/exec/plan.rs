// src/exec/plan.rs

//! Turning requested targets into an ordered execution list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::paths::{RelativeGlob, normalize};
use crate::dag::{DependencyGraph, Node, requires_build, transitive_dependencies};
use crate::errors::{DagmakeError, Result};
use crate::spec::{Builder, BuilderMap};
use crate::types::BuildMode;

/// One node to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub path: PathBuf,
    pub declared_path: String,
}

impl PlanStep {
    fn from_node(node: &Node) -> Self {
        Self {
            path: node.path().to_path_buf(),
            declared_path: node.declared_path().to_string(),
        }
    }
}

/// The ordered execution list for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub mode: BuildMode,
    /// Canonical paths of the resolved targets, in request order.
    pub targets: Vec<PathBuf>,
    /// Nodes to execute, dependencies before dependents.
    pub steps: Vec<PlanStep>,
    /// Targets that needed nothing.
    pub up_to_date: Vec<PathBuf>,
    /// Planned nodes dropped because they have no builder or share one with
    /// an earlier step.
    pub skipped: Vec<PathBuf>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn paths(&self) -> Vec<&Path> {
        self.steps.iter().map(|s| s.path.as_path()).collect()
    }
}

/// Resolve each request by exact path, then by glob, relative to `cwd`.
///
/// Every request must match at least one node.
pub fn resolve_targets<'g>(
    graph: &'g DependencyGraph,
    requests: &[String],
    cwd: &Path,
) -> Result<Vec<&'g Node>> {
    let mut resolved: Vec<&Node> = Vec::new();

    for request in requests {
        let exact = normalize(cwd, request);
        if let Some(node) = graph.get(&exact) {
            resolved.push(node);
            continue;
        }

        let Some(glob) = RelativeGlob::new(cwd, request)? else {
            return Err(DagmakeError::NoSuchTarget(request.clone()));
        };

        let before = resolved.len();
        resolved.extend(graph.nodes().filter(|n| glob.is_match(n.path())));

        if resolved.len() == before {
            return Err(DagmakeError::NoSuchTarget(request.clone()));
        }
        debug!(pattern = %request, matched = resolved.len() - before, "resolved target glob");
    }

    Ok(resolved)
}

/// Build the execution list for `requests`.
///
/// Per target: the stale part of its closure (normal) or the whole closure
/// (force/clean), then the target itself. Entries are de-duplicated by path
/// keeping the first occurrence. Nodes without a builder are dropped, and
/// outside clean mode a builder responsible for several planned outputs is
/// scheduled once.
pub fn plan(
    graph: &DependencyGraph,
    builders: &BuilderMap,
    requests: &[String],
    cwd: &Path,
    mode: BuildMode,
) -> Result<Plan> {
    let targets = resolve_targets(graph, requests, cwd)?;

    let mut ordered: Vec<&Node> = Vec::new();
    let mut up_to_date = Vec::new();

    for &target in &targets {
        let deps = if mode.uses_full_closure() {
            transitive_dependencies(graph, target)?
        } else {
            let stale = requires_build(graph, target)?;
            if stale.is_empty() && target.exists_on_disk() {
                info!(target = %target.declared_path(), "already up to date");
                up_to_date.push(target.path().to_path_buf());
                continue;
            }
            stale
        };

        ordered.extend(deps);
        ordered.push(target);
    }

    let mut seen_paths: HashSet<&Path> = HashSet::new();
    let mut seen_builders: Vec<&Arc<Builder>> = Vec::new();
    let mut steps = Vec::new();
    let mut skipped = Vec::new();

    for node in ordered {
        if !seen_paths.insert(node.path()) {
            continue;
        }

        let Some(builder) = builders.get(node.path()) else {
            skipped.push(node.path().to_path_buf());
            continue;
        };

        if mode != BuildMode::Clean {
            if seen_builders.iter().any(|b| Arc::ptr_eq(b, builder)) {
                debug!(
                    node = %node.declared_path(),
                    builder = %builder.label,
                    "builder already planned; skipping"
                );
                skipped.push(node.path().to_path_buf());
                continue;
            }
            seen_builders.push(builder);
        }

        steps.push(PlanStep::from_node(node));
    }

    debug!(
        %mode,
        targets = targets.len(),
        steps = steps.len(),
        up_to_date = up_to_date.len(),
        "planned build"
    );

    Ok(Plan {
        mode,
        targets: targets.iter().map(|t| t.path().to_path_buf()).collect(),
        steps,
        up_to_date,
        skipped,
    })
}
