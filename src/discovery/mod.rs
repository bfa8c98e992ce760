// src/discovery/mod.rs

//! Locating governing specs and merging the graphs of specs in other
//! directories that a build depends on.
//!
//! A spec only knows its own directory. When one of its dependencies is not
//! declared by any rule, the spec governing that dependency's path is loaded,
//! fully resolved itself, and merged in. The set of spec directories already
//! on the current discovery path guarantees termination for directories that
//! depend on each other.

pub mod locator;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{DagmakeError, Result};
use crate::spec::{CompiledSpec, Spec, load_spec};

pub use locator::{SpecLocator, find_all_specs};

#[derive(Debug, Default)]
pub struct Discovery {
    locator: SpecLocator,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_governing_spec(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        self.locator.find_governing_spec(path)
    }

    pub fn read_spec(&self, file: &Path) -> Result<Spec> {
        load_spec(file)
    }

    /// Compile `spec`, pull in every spec its dependencies need, and check the
    /// result is acyclic and has no missing inputs.
    ///
    /// Rules of merged specs are appended to `spec`.
    pub fn read_graph(&mut self, spec: &mut Spec) -> Result<CompiledSpec> {
        if spec.rules().is_empty() {
            return Err(DagmakeError::Config(format!(
                "spec in '{}' does not declare any outputs",
                spec.root_path().display()
            )));
        }

        let mut compiled = spec.compile()?;
        let visited = vec![spec.root_path().to_path_buf()];
        self.discover_subgraphs(&mut compiled, spec, &visited)?;

        compiled.graph.ensure_acyclic()?;

        let missing: Vec<String> = compiled
            .graph
            .missing_dependencies()
            .iter()
            .map(|n| n.declared_path().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DagmakeError::MissingDependencies(missing));
        }

        info!(
            root = %compiled.graph.root_path().display(),
            nodes = compiled.graph.len(),
            specs = 1 + spec.merged_files().len(),
            "dependency graph ready"
        );
        Ok(compiled)
    }

    /// Merge in the specs governing `compiled`'s undeclared dependencies.
    ///
    /// Each sub-spec is resolved recursively before it is merged, with its
    /// own directory added to `visited`.
    pub fn discover_subgraphs(
        &mut self,
        compiled: &mut CompiledSpec,
        spec: &mut Spec,
        visited: &[PathBuf],
    ) -> Result<()> {
        let undeclared: Vec<PathBuf> = compiled
            .graph
            .undeclared_dependencies()
            .iter()
            .map(|n| n.path().to_path_buf())
            .collect();
        let mut merged_dirs: Vec<PathBuf> = Vec::new();

        for dep in undeclared {
            if compiled.graph.get(&dep).is_some_and(|n| n.is_declared()) {
                continue;
            }

            let Some(file) = self.locator.find_governing_spec(&dep)? else {
                continue;
            };
            let Some(dir) = file.parent().map(Path::to_path_buf) else {
                continue;
            };
            if visited.contains(&dir) || merged_dirs.contains(&dir) {
                continue;
            }

            debug!(
                dependency = %dep.display(),
                spec = %file.display(),
                "discovered spec for undeclared dependency"
            );

            let mut other_spec = self.read_spec(&file)?;
            let mut other = other_spec.compile()?;

            let mut nested = visited.to_vec();
            nested.push(dir.clone());
            self.discover_subgraphs(&mut other, &mut other_spec, &nested)?;

            compiled.merge(other);
            spec.merge(other_spec);
            merged_dirs.push(dir);
        }

        Ok(())
    }
}
