// src/spec/mod.rs

//! Declarative build rules and their compilation into a dependency graph.
//!
//! - [`model`] is the TOML-backed data model of a spec file.
//! - [`loader`] reads a spec file from disk.
//! - [`validate`] checks rule-level invariants.
//! - [`template`] renders per-input output paths.
//! - [`inputs`] resolves literal inputs and expands globs.
//! - [`compile`] turns a [`Spec`] into a graph plus builder map.

pub mod compile;
pub mod inputs;
pub mod loader;
pub mod model;
pub mod template;
pub mod validate;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{DagmakeError, Result};
use crate::exec::{Action, ShellAction};

pub use compile::{Builder, BuilderMap, CompiledSpec};
pub use loader::{load_and_validate, load_from_path, load_spec};
pub use model::{ConfigSection, OneOrMany, RawSpecFile, RuleConfig, SPEC_FILE_NAME, SpecFile};
pub use template::OutputTemplate;

/// Maps one resolved absolute input path to an output path.
pub type OutputFn = Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>;

/// The outputs a rule declares.
#[derive(Clone)]
pub enum Outputs {
    /// Paths relative to the spec directory (or absolute).
    Literal(Vec<String>),
    /// One output per resolved input.
    PerInput(OutputFn),
}

impl fmt::Debug for Outputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outputs::Literal(paths) => f.debug_tuple("Literal").field(paths).finish(),
            Outputs::PerInput(_) => f.write_str("PerInput(..)"),
        }
    }
}

/// One build rule: outputs, inputs, tags and the action producing them.
#[derive(Debug, Clone)]
pub struct Rule {
    pub label: String,
    pub outputs: Outputs,
    pub inputs: Vec<String>,
    pub tags: Vec<String>,
    pub stream: bool,
    /// Snapshot files around this rule's action (see `ChangeTracker`).
    pub track_changes: bool,
    pub action: Arc<dyn Action>,
    /// Directory the rule's relative paths resolve against. Set when the
    /// rule is added to a [`Spec`].
    root: Option<PathBuf>,
}

impl Rule {
    pub fn new(outputs: Outputs, action: Arc<dyn Action>) -> Self {
        let label = match &outputs {
            Outputs::Literal(paths) => paths.first().cloned().unwrap_or_default(),
            Outputs::PerInput(_) => action.name().to_string(),
        };
        Self {
            label,
            outputs,
            inputs: Vec::new(),
            tags: Vec::new(),
            stream: false,
            track_changes: false,
            action,
            root: None,
        }
    }

    /// Rule with a single literal output.
    pub fn output(path: impl Into<String>, action: Arc<dyn Action>) -> Self {
        Self::new(Outputs::Literal(vec![path.into()]), action)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_change_tracking(mut self, track_changes: bool) -> Self {
        self.track_changes = track_changes;
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// In-memory representation of one spec: its directory, settings and rules.
///
/// After discovery a spec may also carry rules merged in from other specs;
/// each rule remembers the directory it was declared in.
#[derive(Debug, Clone)]
pub struct Spec {
    file: Option<PathBuf>,
    root_path: PathBuf,
    config: ConfigSection,
    rules: Vec<Rule>,
    merged_files: Vec<PathBuf>,
}

impl Spec {
    /// Empty spec rooted at `root_path`, for specs built in code.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            file: None,
            root_path: root_path.into(),
            config: ConfigSection::default(),
            rules: Vec::new(),
            merged_files: Vec::new(),
        }
    }

    /// Build a spec from a validated file located at `path`.
    pub fn from_file(path: &Path, file: SpecFile) -> Result<Self> {
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| DagmakeError::Config(format!("spec path has no directory: {}", path.display())))?;

        let mut spec = Spec::new(root.clone());
        spec.file = Some(path.to_path_buf());
        spec.config = file.config.clone();

        for (index, rc) in file.rule.iter().enumerate() {
            let label = rc.label(index);
            let action: Arc<dyn Action> = Arc::new(ShellAction::new(
                label.clone(),
                rc.cmd.clone(),
                spec.config.shell.clone(),
            ));

            let outputs = match (&rc.output, &rc.output_template) {
                (_, Some(template)) => {
                    Outputs::PerInput(OutputTemplate::parse(template)?.into_output_fn(root.clone()))
                }
                (Some(output), None) => Outputs::Literal(output.to_vec()),
                (None, None) => {
                    return Err(DagmakeError::Config(format!("rule '{label}' declares no outputs")));
                }
            };

            let rule = Rule::new(outputs, action)
                .with_label(label)
                .with_inputs(rc.inputs.to_vec())
                .with_stream(rc.stream);
            let rule = rc
                .tags
                .to_vec()
                .into_iter()
                .fold(rule, |rule, tag| rule.with_tag(tag))
                .with_change_tracking(spec.config.track_changes);
            spec.add_rule(rule);
        }

        Ok(spec)
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Spec files whose rules were merged into this one.
    pub fn merged_files(&self) -> &[PathBuf] {
        &self.merged_files
    }

    /// Append a rule; it resolves its paths against this spec's directory.
    pub fn add_rule(&mut self, mut rule: Rule) -> &mut Self {
        if rule.root.is_none() {
            rule.root = Some(self.root_path.clone());
        }
        self.rules.push(rule);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.add_rule(rule);
        self
    }

    /// Append `other`'s rules after this spec's own.
    pub fn merge(&mut self, other: Spec) -> &mut Self {
        if let Some(file) = other.file {
            self.merged_files.push(file);
        }
        self.merged_files.extend(other.merged_files);

        for mut rule in other.rules {
            if rule.root.is_none() {
                rule.root = Some(other.root_path.clone());
            }
            self.rules.push(rule);
        }
        self
    }
}
