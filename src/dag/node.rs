// src/dag/node.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One absolute, normalized filesystem path in a [`DependencyGraph`].
///
/// Dependencies are stored as graph keys rather than references; the graph
/// owns every node and resolves edges through its own map.
///
/// [`DependencyGraph`]: crate::dag::DependencyGraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) path: PathBuf,
    pub(crate) declared_path: String,
    pub(crate) owning_root: PathBuf,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) stream_output: bool,
    /// `true` if some rule declares this path as an output; `false` for
    /// dependency-only nodes.
    pub(crate) declared: bool,
    pub(crate) dependencies: Vec<PathBuf>,
}

impl Node {
    pub(crate) fn declared(
        path: PathBuf,
        declared_path: String,
        owning_root: PathBuf,
        tags: BTreeSet<String>,
        stream_output: bool,
    ) -> Self {
        Self {
            path,
            declared_path,
            owning_root,
            tags,
            stream_output,
            declared: true,
            dependencies: Vec::new(),
        }
    }

    pub(crate) fn dependency_only(path: PathBuf, declared_path: String, owning_root: PathBuf) -> Self {
        Self {
            path,
            declared_path,
            owning_root,
            tags: BTreeSet::new(),
            stream_output: false,
            declared: false,
            dependencies: Vec::new(),
        }
    }

    /// Canonical absolute path (the graph key).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as written in the spec, for messages.
    pub fn declared_path(&self) -> &str {
        &self.declared_path
    }

    /// Directory of the spec that created this node.
    pub fn owning_root(&self) -> &Path {
        &self.owning_root
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn stream_output(&self) -> bool {
        self.stream_output
    }

    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Direct dependencies, in declaration order.
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.dependencies
    }

    pub fn exists_on_disk(&self) -> bool {
        self.path.exists()
    }
}
