// src/spec/model.rs

use serde::Deserialize;

/// Reserved file name that anchors a directory subtree as one spec's scope.
pub const SPEC_FILE_NAME: &str = "Dagmake.toml";

/// Spec file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// shell = "sh"
///
/// [[rule]]
/// output = "out/app.zip"
/// inputs = ["gen/api.rb", "docs/*.md"]
/// tags = ["dist"]
/// cmd = "zip {out} {ins}"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawSpecFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Rules in file order.
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

/// Validated spec file. Construct via `SpecFile::try_from(RawSpecFile)`.
#[derive(Debug, Clone)]
pub struct SpecFile {
    pub config: ConfigSection,
    pub rule: Vec<RuleConfig>,
}

impl SpecFile {
    pub(crate) fn new_unchecked(config: ConfigSection, rule: Vec<RuleConfig>) -> Self {
        Self { config, rule }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Program used to run each rule's `cmd`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Snapshot files around every action of this spec and warn about
    /// undeclared reads and writes.
    #[serde(default)]
    pub track_changes: bool,
}

fn default_shell() -> String {
    if cfg!(windows) { "cmd".to_string() } else { "sh".to_string() }
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            track_changes: false,
        }
    }
}

/// A string or a list of strings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

/// `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Optional label used in messages.
    #[serde(default)]
    pub name: Option<String>,

    /// Literal output path(s), relative to the spec directory.
    #[serde(default)]
    pub output: Option<OneOrMany>,

    /// One output per input, rendered from placeholders such as `{stem}`.
    ///
    /// All outputs share one builder, so `cmd` runs once for the whole rule
    /// and has to produce every output (`{outs}`), not just `{out}`.
    #[serde(default)]
    pub output_template: Option<String>,

    /// Literal paths and/or glob patterns.
    #[serde(default)]
    pub inputs: OneOrMany,

    #[serde(default)]
    pub tags: OneOrMany,

    /// Stream the command's output to the terminal instead of the log.
    #[serde(default)]
    pub stream: bool,

    /// Shell command; `{ins}`, `{outs}`, `{in}` and `{out}` are substituted.
    pub cmd: String,
}

impl RuleConfig {
    /// Label for messages: the explicit name, else the first output.
    pub fn label(&self, index: usize) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (&self.output, &self.output_template) {
            (Some(out), _) => out
                .to_vec()
                .first()
                .cloned()
                .unwrap_or_else(|| format!("rule #{index}")),
            (None, Some(template)) => template.clone(),
            (None, None) => format!("rule #{index}"),
        }
    }
}
