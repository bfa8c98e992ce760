// src/lib.rs

pub mod cli;
pub mod dag;
pub mod discovery;
pub mod errors;
pub mod exec;
pub mod inspect;
pub mod logging;
pub mod spec;
pub mod types;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::dag::paths::normalize;
use crate::discovery::{Discovery, find_all_specs};
use crate::errors::{DagmakeError, Result};
use crate::exec::{BuildSummary, Executor, Interrupt, resolve_targets};
use crate::spec::{CompiledSpec, load_spec};
use crate::types::BuildMode;

/// Knobs for one build invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub mode: BuildMode,
    /// Run the change tracker around every action.
    pub track_changes: bool,
}

/// High-level entry point used by `main.rs`.
///
/// Dispatches to listing, tree display, or a build of the requested targets
/// (with Ctrl-C wired to interrupt the running action).
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;

    if let Some(filter) = &args.list {
        print!("{}", list_targets(&cwd, filter.as_deref())?);
        return Ok(());
    }

    if args.targets.is_empty() {
        return Err(DagmakeError::Config(
            "no targets given; pass a file to build or use --list".to_string(),
        ));
    }

    if args.show_tree {
        for target in &args.targets {
            print!("{}", show_tree(&cwd, target)?);
        }
        return Ok(());
    }

    let options = BuildOptions {
        mode: args.mode(),
        track_changes: args.track_changes,
    };
    let summaries = build_targets(&cwd, &args.targets, options, Interrupt::ctrl_c()).await?;

    let executed: usize = summaries.iter().map(|s| s.executed.len()).sum();
    if executed == 0 && options.mode == BuildMode::Normal {
        info!("All files up to date.");
    }
    Ok(())
}

/// Build `targets` (paths or globs relative to `cwd`).
///
/// Targets are grouped by their governing spec; each group gets one
/// discovered graph and one executor run, in request order.
pub async fn build_targets(
    cwd: &Path,
    targets: &[String],
    options: BuildOptions,
    interrupt: Interrupt,
) -> Result<Vec<BuildSummary>> {
    let mut discovery = Discovery::new();
    let mut groups: Vec<(PathBuf, Vec<String>)> = Vec::new();

    for target in targets {
        let absolute = normalize(cwd, target);
        let file = discovery
            .find_governing_spec(&absolute)?
            .ok_or_else(|| DagmakeError::NoSpecFound(absolute.clone()))?;

        match groups.iter_mut().find(|(f, _)| *f == file) {
            Some((_, group)) => group.push(target.clone()),
            None => groups.push((file, vec![target.clone()])),
        }
    }

    let mut summaries = Vec::with_capacity(groups.len());
    for (file, group) in groups {
        debug!(spec = %file.display(), targets = ?group, "building targets of spec");

        let mut spec = discovery.read_spec(&file)?;
        let compiled = discovery.read_graph(&mut spec)?;

        let mut executor = Executor::for_compiled(&compiled)
            .with_interrupt(interrupt.clone())
            .with_change_tracking(options.track_changes);
        summaries.push(executor.build(&group, cwd, options.mode).await?);
    }

    Ok(summaries)
}

/// Declared targets of every spec below and above `cwd`, grouped by tag.
pub fn list_targets(cwd: &Path, filter: Option<&str>) -> Result<String> {
    let mut merged = CompiledSpec::new(cwd);

    for file in find_all_specs(cwd)? {
        let spec = load_spec(&file)?;
        merged.merge(spec.compile()?);
    }

    let groups = inspect::list_targets(&merged.graph, cwd, filter)?;
    Ok(inspect::format_listing(&groups))
}

/// Dependency tree of `target` after full discovery.
pub fn show_tree(cwd: &Path, target: &str) -> Result<String> {
    let mut discovery = Discovery::new();
    let absolute = normalize(cwd, target);
    let file = discovery
        .find_governing_spec(&absolute)?
        .ok_or_else(|| DagmakeError::NoSpecFound(absolute.clone()))?;

    let mut spec = discovery.read_spec(&file)?;
    let compiled = discovery.read_graph(&mut spec)?;

    let nodes = resolve_targets(&compiled.graph, &[target.to_string()], cwd)?;
    Ok(nodes
        .into_iter()
        .map(|node| inspect::render_tree(&compiled.graph, node, cwd))
        .collect())
}
