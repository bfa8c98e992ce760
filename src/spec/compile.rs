// src/spec/compile.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::dag::DependencyGraph;
use crate::errors::Result;
use crate::exec::Action;
use crate::spec::inputs::resolve_inputs;
use crate::spec::{Outputs, Rule, Spec};

/// The action responsible for one rule's outputs.
///
/// Every output of a rule maps to the same `Arc<Builder>`; pointer identity
/// is builder identity, so a multi-output rule runs once per build.
pub struct Builder {
    pub label: String,
    pub action: Arc<dyn Action>,
    /// All canonical outputs the rule declares.
    pub outputs: Vec<PathBuf>,
    pub stream: bool,
    pub track_changes: bool,
    pub owning_root: PathBuf,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("label", &self.label)
            .field("action", &self.action.name())
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Canonical output path -> builder.
pub type BuilderMap = BTreeMap<PathBuf, Arc<Builder>>;

/// A spec compiled into its dependency graph and builder map.
#[derive(Debug, Clone)]
pub struct CompiledSpec {
    pub graph: DependencyGraph,
    pub builders: BuilderMap,
}

impl CompiledSpec {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            graph: DependencyGraph::new(root),
            builders: BuilderMap::new(),
        }
    }

    /// Merge another compiled spec into this one. On conflicting outputs the
    /// incoming builder wins, matching [`DependencyGraph::merge`].
    pub fn merge(&mut self, other: CompiledSpec) -> &mut Self {
        self.graph.merge(other.graph);
        self.builders.extend(other.builders);
        self
    }

    pub fn builder_for(&self, path: &Path) -> Option<&Arc<Builder>> {
        self.builders.get(path)
    }
}

impl Spec {
    /// Compile every rule into a graph rooted at this spec's directory.
    ///
    /// Rules merged in from other specs are compiled against their own
    /// directories and merged, so every declared path stays inside the
    /// directory of the spec that declared it.
    pub fn compile(&self) -> Result<CompiledSpec> {
        let mut compiled = CompiledSpec::new(self.root_path());
        let mut foreign: Vec<CompiledSpec> = Vec::new();

        for rule in self.rules() {
            let root = rule.root().unwrap_or(self.root_path());
            if root == self.root_path() {
                compile_rule(&mut compiled, rule, root)?;
                continue;
            }

            let index = match foreign.iter().position(|c| c.graph.root_path() == root) {
                Some(index) => index,
                None => {
                    foreign.push(CompiledSpec::new(root));
                    foreign.len() - 1
                }
            };
            compile_rule(&mut foreign[index], rule, root)?;
        }

        for other in foreign {
            compiled.merge(other);
        }

        debug!(
            root = %self.root_path().display(),
            nodes = compiled.graph.len(),
            builders = compiled.builders.len(),
            "compiled spec"
        );
        Ok(compiled)
    }
}

fn compile_rule(compiled: &mut CompiledSpec, rule: &Rule, root: &Path) -> Result<()> {
    let inputs = resolve_inputs(root, &rule.inputs)?;

    let declared_outputs: Vec<PathBuf> = match &rule.outputs {
        Outputs::Literal(paths) => paths.iter().map(PathBuf::from).collect(),
        Outputs::PerInput(output_fn) => inputs.iter().map(|input| (**output_fn)(&input.path)).collect(),
    };

    let mut outputs = Vec::with_capacity(declared_outputs.len());
    for declared in &declared_outputs {
        let node = compiled
            .graph
            .add_output(declared, &rule.tags, rule.stream)?;
        outputs.push(node.path().to_path_buf());
    }

    let builder = Arc::new(Builder {
        label: rule.label.clone(),
        action: Arc::clone(&rule.action),
        outputs: outputs.clone(),
        stream: rule.stream,
        track_changes: rule.track_changes,
        owning_root: root.to_path_buf(),
    });

    for output in &outputs {
        compiled.builders.insert(output.clone(), Arc::clone(&builder));
        for input in &inputs {
            compiled.graph.add_dependency(output, &input.declared)?;
        }
    }

    Ok(())
}
