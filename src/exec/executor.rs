// src/exec/executor.rs

//! Sequential execution of a [`Plan`].
//!
//! One node at a time, in plan order. The graph and builder map are only
//! read; an interrupt is observed between nodes and while an action runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::dag::DependencyGraph;
use crate::errors::{DagmakeError, Result};
use crate::exec::action::ActionContext;
use crate::exec::change_tracker::ChangeTracker;
use crate::exec::interrupt::Interrupt;
use crate::exec::plan::{self, Plan};
use crate::spec::{BuilderMap, CompiledSpec};
use crate::types::{BuildMode, ExecutorState};

/// Outcome of one successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub mode: BuildMode,
    /// Nodes whose action ran (or whose output was removed, in clean mode).
    pub executed: Vec<PathBuf>,
    /// Planned nodes that needed no action.
    pub skipped: Vec<PathBuf>,
    /// Targets that were already up to date.
    pub up_to_date: Vec<PathBuf>,
}

impl BuildSummary {
    fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            executed: Vec::new(),
            skipped: Vec::new(),
            up_to_date: Vec::new(),
        }
    }
}

pub struct Executor<'g> {
    graph: &'g DependencyGraph,
    builders: &'g BuilderMap,
    interrupt: Interrupt,
    track_changes: bool,
    state: ExecutorState,
}

impl<'g> Executor<'g> {
    pub fn new(graph: &'g DependencyGraph, builders: &'g BuilderMap) -> Self {
        Self {
            graph,
            builders,
            interrupt: Interrupt::never(),
            track_changes: false,
            state: ExecutorState::Idle,
        }
    }

    pub fn for_compiled(compiled: &'g CompiledSpec) -> Self {
        Self::new(&compiled.graph, &compiled.builders)
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Track changes around every action, not only rules that ask for it.
    pub fn with_change_tracking(mut self, track_changes: bool) -> Self {
        self.track_changes = track_changes;
        self
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn plan(&mut self, targets: &[String], cwd: &Path, mode: BuildMode) -> Result<Plan> {
        self.state = ExecutorState::Planning;
        let result = plan::plan(self.graph, self.builders, targets, cwd, mode);
        if result.is_err() {
            self.state = ExecutorState::Failed;
        }
        result
    }

    /// Plan and run in one go.
    pub async fn build(&mut self, targets: &[String], cwd: &Path, mode: BuildMode) -> Result<BuildSummary> {
        let plan = self.plan(targets, cwd, mode)?;
        self.run(&plan).await
    }

    /// Execute every step of `plan`; the first failure aborts the rest.
    pub async fn run(&mut self, plan: &Plan) -> Result<BuildSummary> {
        self.state = ExecutorState::Executing;
        let mut summary = BuildSummary::new(plan.mode);
        summary.up_to_date = plan.up_to_date.clone();
        summary.skipped = plan.skipped.clone();

        for step in &plan.steps {
            if self.interrupt.is_triggered() {
                warn!(node = %step.declared_path, "interrupted before node");
                self.state = ExecutorState::Failed;
                return Err(DagmakeError::Interrupted {
                    node: step.declared_path.clone(),
                });
            }

            match self.execute(&step.path, plan.mode).await {
                Ok(true) => summary.executed.push(step.path.clone()),
                Ok(false) => summary.skipped.push(step.path.clone()),
                Err(e) => {
                    self.state = ExecutorState::Failed;
                    return Err(e);
                }
            }
        }

        self.state = ExecutorState::Done;
        info!(
            mode = %plan.mode,
            executed = summary.executed.len(),
            up_to_date = summary.up_to_date.len(),
            "build finished"
        );
        Ok(summary)
    }

    /// Execute a single node. Returns `false` if it has no builder.
    pub async fn execute(&self, path: &Path, mode: BuildMode) -> Result<bool> {
        let graph = self.graph;
        let builders = self.builders;

        let Some(builder) = builders.get(path) else {
            debug!(node = %path.display(), "no builder registered; skipping");
            return Ok(false);
        };
        let node = graph
            .get(path)
            .ok_or_else(|| DagmakeError::UnknownNode(path.to_path_buf()))?;
        let label = node.declared_path().to_string();

        if mode == BuildMode::Clean {
            remove_output(path).await?;
            return Ok(true);
        }

        for output in &builder.outputs {
            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let ctx = ActionContext {
            node: path.to_path_buf(),
            inputs: node.dependencies().to_vec(),
            outputs: builder.outputs.clone(),
            working_dir: builder.owning_root.clone(),
            stream: builder.stream || node.stream_output(),
        };

        let tracker = if self.track_changes || builder.track_changes {
            Some(ChangeTracker::snapshot_async(graph, node, &builder.outputs).await?)
        } else {
            None
        };

        info!(node = %label, action = %builder.action.name(), "building");
        let mut interrupt = self.interrupt.clone();
        let result = tokio::select! {
            result = builder.action.run(&ctx) => result,
            _ = interrupt.triggered() => {
                warn!(node = %label, "interrupted; stopping action");
                return Err(DagmakeError::Interrupted { node: label });
            }
        };

        if let Err(e) = result {
            return Err(DagmakeError::Runtime {
                node: label,
                message: format!("{e:#}"),
            });
        }

        if let Some(tracker) = tracker {
            tracker.changes_async().await?.log_warnings(&label);
        }

        if let Some(missing) = builder.outputs.iter().find(|o| !o.exists()) {
            return Err(DagmakeError::BuildIncomplete {
                node: label,
                path: missing.clone(),
            });
        }

        debug!(node = %label, "built");
        Ok(true)
    }
}

/// Remove a file or directory; a missing path is not an error.
async fn remove_output(path: &Path) -> Result<()> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "nothing to clean");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if meta.is_dir() {
        // Never recurse: anything left inside was not declared by a rule.
        match tokio::fs::remove_dir(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => {
                warn!(path = %path.display(), "output directory is not empty; leaving it in place");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        tokio::fs::remove_file(path).await?;
    }
    info!(path = %path.display(), "removed");
    Ok(())
}
