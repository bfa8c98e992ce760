// src/inspect.rs

//! Read-only views over a graph for the CLI: target listing and a text
//! dependency tree.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::dag::paths::{RelativeGlob, display_relative, is_descendant, normalize};
use crate::dag::{DependencyGraph, Node};
use crate::errors::Result;

/// Group label for declared nodes without tags.
pub const UNTAGGED: &str = "-";

/// Declared targets grouped by tag, as paths relative to `base`.
///
/// `filter` is a path (keeps that node and everything below it) or a glob,
/// both relative to `base`.
pub fn list_targets(
    graph: &DependencyGraph,
    base: &Path,
    filter: Option<&str>,
) -> Result<BTreeMap<String, Vec<String>>> {
    let keep: Box<dyn Fn(&Node) -> bool> = match filter {
        None => Box::new(|_: &Node| true),
        Some(filter) => match RelativeGlob::new(base, filter)? {
            Some(glob) => Box::new(move |n: &Node| glob.is_match(n.path())),
            None => {
                let prefix = normalize(base, filter);
                Box::new(move |n: &Node| is_descendant(&prefix, n.path()))
            }
        },
    };

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in graph.filter_nodes(|n| n.is_declared() && keep(n)) {
        let shown = display_relative(base, node.path());
        if node.tags().is_empty() {
            groups.entry(UNTAGGED.to_string()).or_default().push(shown);
            continue;
        }
        for tag in node.tags() {
            groups.entry(tag.clone()).or_default().push(shown.clone());
        }
    }
    Ok(groups)
}

/// Render [`list_targets`] output, one tag header per group.
pub fn format_listing(groups: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::new();
    for (tag, paths) in groups {
        let _ = writeln!(out, "{tag}:");
        for path in paths {
            let _ = writeln!(out, "  {path}");
        }
    }
    out
}

/// Text tree of `node`'s dependencies, paths relative to `base`.
pub fn render_tree(graph: &DependencyGraph, node: &Node, base: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", display_relative(base, node.path()));
    let mut stack = vec![node.path().to_path_buf()];
    render_children(graph, node, base, "", &mut stack, &mut out);
    out
}

fn render_children(
    graph: &DependencyGraph,
    node: &Node,
    base: &Path,
    prefix: &str,
    stack: &mut Vec<PathBuf>,
    out: &mut String,
) {
    let deps = node.dependencies();
    for (i, dep) in deps.iter().enumerate() {
        let last = i + 1 == deps.len();
        let (branch, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        let _ = writeln!(out, "{prefix}{branch}{}", display_relative(base, dep));

        // Guard against cycles introduced by merges.
        if stack.contains(dep) {
            continue;
        }
        if let Some(child) = graph.get(dep) {
            stack.push(dep.clone());
            render_children(graph, child, base, &format!("{prefix}{indent}"), stack, out);
            stack.pop();
        }
    }
}
