// src/exec/change_tracker.rs

//! Advisory before/after snapshots around one action.
//!
//! Findings are logged as warnings and never fail a build.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::dag::{DependencyGraph, Node, transitive_dependencies};
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    modified: Option<SystemTime>,
    accessed: Option<SystemTime>,
}

type Snapshot = BTreeMap<PathBuf, Stamp>;

/// Files watched around a single node's action.
#[derive(Debug, Clone)]
pub struct ChangeTracker {
    inputs: BTreeSet<PathBuf>,
    outputs: BTreeSet<PathBuf>,
    /// Directory scanned for undeclared files.
    scope: PathBuf,
    declared_before: Snapshot,
    undeclared_before: Snapshot,
}

/// What changed (or did not) while the action ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    /// Declared inputs whose access time did not move.
    pub unread_inputs: Vec<PathBuf>,
    /// Declared outputs whose modification time did not move.
    pub unmodified_outputs: Vec<PathBuf>,
    /// Declared inputs absent after the action.
    pub missing_inputs: Vec<PathBuf>,
    /// Declared outputs absent after the action.
    pub uncreated_outputs: Vec<PathBuf>,
    pub undeclared_read: Vec<PathBuf>,
    pub undeclared_modified: Vec<PathBuf>,
    pub undeclared_created: Vec<PathBuf>,
}

impl ChangeReport {
    pub fn is_clean(&self) -> bool {
        self.unread_inputs.is_empty()
            && self.unmodified_outputs.is_empty()
            && self.missing_inputs.is_empty()
            && self.uncreated_outputs.is_empty()
            && self.undeclared_read.is_empty()
            && self.undeclared_modified.is_empty()
            && self.undeclared_created.is_empty()
    }

    pub fn log_warnings(&self, node: &str) {
        let groups: [(&str, &Vec<PathBuf>); 7] = [
            ("declared input was never read", &self.unread_inputs),
            ("declared output was not modified", &self.unmodified_outputs),
            ("declared input does not exist", &self.missing_inputs),
            ("declared output was not created", &self.uncreated_outputs),
            ("undeclared file was read", &self.undeclared_read),
            ("undeclared file was modified", &self.undeclared_modified),
            ("undeclared file was created", &self.undeclared_created),
        ];

        for (message, paths) in groups {
            for path in paths {
                warn!(node, path = %path.display(), "{message}");
            }
        }
    }
}

impl ChangeTracker {
    /// Snapshot the declared and undeclared sets before `node`'s action runs.
    ///
    /// Declared inputs are the node's transitive dependencies; the undeclared
    /// set is every other file below the node's directory.
    pub fn snapshot(graph: &DependencyGraph, node: &Node, outputs: &[PathBuf]) -> Result<Self> {
        let (inputs, outputs, scope) = declared_sets(graph, node, outputs)?;
        Ok(Self::capture(inputs, outputs, scope, node.declared_path()))
    }

    /// [`snapshot`](Self::snapshot) with the filesystem scan moved to the
    /// blocking thread pool.
    pub async fn snapshot_async(
        graph: &DependencyGraph,
        node: &Node,
        outputs: &[PathBuf],
    ) -> Result<Self> {
        let (inputs, outputs, scope) = declared_sets(graph, node, outputs)?;
        let label = node.declared_path().to_string();
        let tracker =
            tokio::task::spawn_blocking(move || Self::capture(inputs, outputs, scope, &label))
                .await
                .map_err(anyhow::Error::from)?;
        Ok(tracker)
    }

    fn capture(
        inputs: BTreeSet<PathBuf>,
        outputs: BTreeSet<PathBuf>,
        scope: PathBuf,
        label: &str,
    ) -> Self {
        let declared_before = stamps(inputs.iter().chain(outputs.iter()));
        let undeclared_before = stamps(
            files_under(&scope)
                .iter()
                .filter(|p| !inputs.contains(*p) && !outputs.contains(*p)),
        );

        debug!(
            node = label,
            declared = declared_before.len(),
            undeclared = undeclared_before.len(),
            "took change-tracking snapshot"
        );

        Self {
            inputs,
            outputs,
            scope,
            declared_before,
            undeclared_before,
        }
    }

    /// [`changes`](Self::changes) on the blocking thread pool.
    pub async fn changes_async(self) -> Result<ChangeReport> {
        let report = tokio::task::spawn_blocking(move || self.changes())
            .await
            .map_err(anyhow::Error::from)?;
        Ok(report)
    }

    /// Re-snapshot and classify.
    pub fn changes(&self) -> ChangeReport {
        let declared_after = stamps(self.inputs.iter().chain(self.outputs.iter()));
        let mut report = ChangeReport::default();

        for input in &self.inputs {
            match (self.declared_before.get(input), declared_after.get(input)) {
                (_, None) => report.missing_inputs.push(input.clone()),
                (Some(before), Some(after)) if before.accessed == after.accessed => {
                    report.unread_inputs.push(input.clone())
                }
                _ => {}
            }
        }

        for output in &self.outputs {
            match (self.declared_before.get(output), declared_after.get(output)) {
                (_, None) => report.uncreated_outputs.push(output.clone()),
                (Some(before), Some(after)) if before.modified == after.modified => {
                    report.unmodified_outputs.push(output.clone())
                }
                _ => {}
            }
        }

        let undeclared_now = files_under(&self.scope);
        for path in undeclared_now {
            if self.inputs.contains(&path) || self.outputs.contains(&path) {
                continue;
            }
            let Some(before) = self.undeclared_before.get(&path) else {
                report.undeclared_created.push(path);
                continue;
            };
            let Some(after) = stamp(&path) else {
                continue;
            };
            if after.modified != before.modified {
                report.undeclared_modified.push(path);
            } else if after.accessed != before.accessed {
                report.undeclared_read.push(path);
            }
        }

        report
    }
}

/// Transitive inputs, outputs and the directory scanned for undeclared files.
fn declared_sets(
    graph: &DependencyGraph,
    node: &Node,
    outputs: &[PathBuf],
) -> Result<(BTreeSet<PathBuf>, BTreeSet<PathBuf>, PathBuf)> {
    let inputs = transitive_dependencies(graph, node)?
        .into_iter()
        .map(|n| n.path().to_path_buf())
        .collect();
    let outputs = outputs.iter().cloned().collect();
    let scope = node
        .path()
        .parent()
        .unwrap_or(node.owning_root())
        .to_path_buf();
    Ok((inputs, outputs, scope))
}

fn stamp(path: &Path) -> Option<Stamp> {
    let meta = std::fs::metadata(path).ok()?;
    Some(Stamp {
        modified: meta.modified().ok(),
        accessed: meta.accessed().ok(),
    })
}

fn stamps<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Snapshot {
    paths
        .into_iter()
        .filter_map(|p| stamp(p).map(|s| (p.clone(), s)))
        .collect()
}

/// Every regular file below `dir`, without following symlinked directories.
fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                stack.push(entry.path());
            } else {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    files
}
