// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a cyclic dependency graph.
pub const CYCLIC_EXIT_CODE: i32 = 3;

#[derive(Error, Debug)]
pub enum DagmakeError {
    #[error("Spec error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// A spec declared an output that normalizes to a path above its own
    /// directory. All relative paths in a spec resolve against that directory.
    #[error(
        "a spec can not declare outputs outside its directory: '{declared}' resolves to '{}', \
         which is not below '{}'",
        normalized.display(),
        root.display()
    )]
    OutsideRoot {
        declared: String,
        normalized: PathBuf,
        root: PathBuf,
    },

    /// Self-dependency, duplicate edge, or a transitive cycle.
    ///
    /// `chain` holds the traversal path that led back to `path` (empty when
    /// the cycle was rejected at edge-insertion time).
    #[error("Cyclic dependency detected: {}", path.display())]
    CyclicDependency { path: PathBuf, chain: Vec<PathBuf> },

    #[error("Unknown node: {}", .0.display())]
    UnknownNode(PathBuf),

    #[error(
        "Some dependencies exist neither as files on disk nor as outputs of any spec:\n{}",
        .0.join("\n")
    )]
    MissingDependencies(Vec<String>),

    #[error("No target matches '{0}'")]
    NoSuchTarget(String),

    #[error("No Dagmake.toml found governing '{}'", .0.display())]
    NoSpecFound(PathBuf),

    #[error("Build of '{node}' finished without creating declared output '{}'", path.display())]
    BuildIncomplete { node: String, path: PathBuf },

    #[error("Building '{node}' failed: {message}")]
    Runtime { node: String, message: String },

    #[error("The build was interrupted while building '{node}'")]
    Interrupted { node: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagmakeError {
    pub fn is_cyclic(&self) -> bool {
        matches!(self, DagmakeError::CyclicDependency { .. })
    }

    /// Process exit code for this error. Cyclic dependencies get their own
    /// code, distinct from clap's usage-error code 2. Everything else
    /// (interrupts included) is a generic failure.
    pub fn exit_code(&self) -> i32 {
        if self.is_cyclic() { CYCLIC_EXIT_CODE } else { 1 }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagmakeError>;
