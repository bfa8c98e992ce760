// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::dag::node::Node;
use crate::dag::paths::{common_ancestor, is_descendant, normalize};
use crate::errors::{DagmakeError, Result};

/// Directed acyclic graph of normalized filesystem paths.
///
/// Nodes live in an arena keyed by their canonical path; edges are stored as
/// keys on the dependent node. Every successful [`add_dependency`] leaves the
/// graph acyclic, and a rejected one leaves it untouched.
///
/// [`add_dependency`]: DependencyGraph::add_dependency
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    root_path: PathBuf,
    nodes: BTreeMap<PathBuf, Node>,
}

impl DependencyGraph {
    /// Create an empty graph rooted at `root_path`.
    ///
    /// A relative root is resolved against the current working directory.
    pub fn new(root_path: impl AsRef<Path>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            root_path: normalize(&cwd, root_path),
            nodes: BTreeMap::new(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Resolve `path` the same way the graph keys its nodes.
    pub fn normalize_path(&self, path: impl AsRef<Path>) -> PathBuf {
        normalize(&self.root_path, path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, declared and dependency-only, ordered by path.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Look up a node by its canonical path.
    pub fn get(&self, canonical: &Path) -> Option<&Node> {
        self.nodes.get(canonical)
    }

    /// Look up a node by a path relative to the graph root (or absolute).
    pub fn lookup(&self, path: impl AsRef<Path>) -> Option<&Node> {
        self.nodes.get(&self.normalize_path(path))
    }

    /// Declare `path` as an output with the given tags.
    pub fn add_path(&mut self, path: impl AsRef<Path>, tags: &[String]) -> Result<&Node> {
        self.add_output(path, tags, false)
    }

    /// Declare `path` as an output, replacing any existing entry for it.
    ///
    /// Fails with [`DagmakeError::OutsideRoot`] if the normalized path is not
    /// below the graph root.
    pub fn add_output(
        &mut self,
        path: impl AsRef<Path>,
        tags: &[String],
        stream_output: bool,
    ) -> Result<&Node> {
        let declared = path.as_ref().to_string_lossy().into_owned();
        let key = self.normalize_path(&path);

        if !is_descendant(&self.root_path, &key) {
            return Err(DagmakeError::OutsideRoot {
                declared,
                normalized: key,
                root: self.root_path.clone(),
            });
        }

        if let Some(existing) = self.nodes.get(&key) {
            if existing.declared {
                warn!(
                    path = %key.display(),
                    "output declared more than once; the later declaration replaces the earlier one"
                );
            }
        }

        let node = Node::declared(
            key.clone(),
            declared,
            self.root_path.clone(),
            tags.iter().cloned().collect(),
            stream_output,
        );
        self.nodes.insert(key.clone(), node);
        Ok(&self.nodes[&key])
    }

    /// Add an edge `from -> to` ("`from` depends on `to`").
    ///
    /// `from` must already be a node; `to` is created as a dependency-only node
    /// if needed. Self-edges, duplicate edges and edges that would close a
    /// cycle are rejected with [`DagmakeError::CyclicDependency`].
    pub fn add_dependency(&mut self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<&Node> {
        let from_key = self.normalize_path(&from);
        let to_declared = to.as_ref().to_string_lossy().into_owned();
        let to_key = self.normalize_path(&to);

        let from_node = self
            .nodes
            .get(&from_key)
            .ok_or_else(|| DagmakeError::UnknownNode(from_key.clone()))?;

        if to_key == from_key
            || from_node.dependencies.contains(&to_key)
            || self.reaches(&to_key, &from_key)
        {
            return Err(DagmakeError::CyclicDependency {
                path: from_key,
                chain: vec![to_key],
            });
        }

        if !self.nodes.contains_key(&to_key) {
            let node = Node::dependency_only(to_key.clone(), to_declared, self.root_path.clone());
            self.nodes.insert(to_key.clone(), node);
        }

        if let Some(from_node) = self.nodes.get_mut(&from_key) {
            from_node.dependencies.push(to_key.clone());
        }

        Ok(&self.nodes[&to_key])
    }

    /// Depth-first: can `target` be reached by following dependencies of `start`?
    fn reaches(&self, start: &Path, target: &Path) -> bool {
        let mut stack: Vec<&Path> = match self.nodes.get(start) {
            Some(node) => node.dependencies.iter().map(PathBuf::as_path).collect(),
            None => return false,
        };
        let mut seen: HashSet<&Path> = HashSet::new();

        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.dependencies.iter().map(PathBuf::as_path));
            }
        }
        false
    }

    /// Union `other` into this graph and re-root at the nearest directory
    /// containing both roots.
    ///
    /// A declared node always beats a dependency-only node for the same path.
    /// When both graphs declare the same output the incoming node wins.
    pub fn merge(&mut self, other: DependencyGraph) -> &mut Self {
        let new_root = common_ancestor(&self.root_path, &other.root_path);
        if new_root != self.root_path {
            debug!(
                from = %self.root_path.display(),
                to = %new_root.display(),
                "re-rooting merged dependency graph"
            );
            self.root_path = new_root;
        }

        for (key, node) in other.nodes {
            let replace = match self.nodes.get(&key) {
                None => true,
                Some(existing) if node.declared => {
                    if existing.declared && *existing != node {
                        warn!(
                            path = %key.display(),
                            previous_root = %existing.owning_root.display(),
                            new_root = %node.owning_root.display(),
                            "output declared by two specs; using the later one"
                        );
                    }
                    true
                }
                Some(_) => false,
            };
            if replace {
                self.nodes.insert(key, node);
            }
        }
        self
    }

    fn referenced(&self) -> BTreeSet<&Path> {
        self.nodes
            .values()
            .flat_map(|n| n.dependencies.iter().map(PathBuf::as_path))
            .collect()
    }

    /// Dependency-only nodes that no rule in this graph produces.
    pub fn undeclared_dependencies(&self) -> Vec<&Node> {
        self.referenced()
            .into_iter()
            .filter_map(|path| self.nodes.get(path))
            .filter(|node| !node.declared)
            .collect()
    }

    /// Undeclared dependencies that also do not exist on disk.
    pub fn missing_dependencies(&self) -> Vec<&Node> {
        self.undeclared_dependencies()
            .into_iter()
            .filter(|node| !node.exists_on_disk())
            .collect()
    }

    pub fn filter_nodes<P>(&self, mut predicate: P) -> Vec<&Node>
    where
        P: FnMut(&Node) -> bool,
    {
        self.nodes.values().filter(|n| predicate(n)).collect()
    }

    /// Declared nodes grouped by tag. A node with several tags appears in
    /// each group; untagged nodes are not included.
    pub fn nodes_by_tag(&self) -> BTreeMap<String, Vec<&Node>> {
        let mut groups: BTreeMap<String, Vec<&Node>> = BTreeMap::new();
        for node in self.nodes.values().filter(|n| n.declared) {
            for tag in &node.tags {
                groups.entry(tag.clone()).or_default().push(node);
            }
        }
        groups
    }

    /// Whole-graph acyclicity check over the current edges.
    ///
    /// Edge insertion already rejects cycles within one graph; merges can
    /// still join two acyclic graphs into a cyclic one.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let mut graph: DiGraphMap<&Path, ()> = DiGraphMap::new();

        for (key, node) in &self.nodes {
            graph.add_node(key.as_path());
            for dep in &node.dependencies {
                graph.add_edge(key.as_path(), dep.as_path(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(DagmakeError::CyclicDependency {
                path: cycle.node_id().to_path_buf(),
                chain: Vec::new(),
            }),
        }
    }
}
