// src/dag/paths.rs

//! Lexical path helpers shared by the graph, spec compiler and discovery.
//!
//! Graph keys must be stable for files that do not exist yet, so paths are
//! normalized lexically (`.` and `..` folded) instead of via `canonicalize`.

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::errors::Result;

/// Resolve `path` against `base` and fold `.` / `..` components.
///
/// Absolute `path`s ignore `base`. `..` at the filesystem root is dropped.
pub fn normalize(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, which is what we want.
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `path` is `root` itself or lies below it.
pub fn is_descendant(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

/// Nearest directory that contains both `a` and `b`.
pub fn common_ancestor(a: &Path, b: &Path) -> PathBuf {
    a.ancestors()
        .find(|candidate| b.starts_with(candidate))
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Render `path` relative to `base` with forward slashes, falling back to the
/// full path when it is not below `base`.
pub fn display_relative(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
        _ => path.to_string_lossy().into_owned(),
    }
}

/// Whether a declared path should be treated as a glob pattern.
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}


/// A glob pattern anchored at a literal base directory.
///
/// Only the authored pattern is classified: leading components without glob
/// characters are resolved against `base` and the rest is matched against
/// paths relative to it, so glob characters in the base directory's own name
/// stay literal.
#[derive(Debug, Clone)]
pub struct RelativeGlob {
    base: PathBuf,
    matcher: GlobMatcher,
}

impl RelativeGlob {
    /// `Ok(None)` when no component of `pattern` is a glob.
    pub fn new(base: &Path, pattern: &str) -> Result<Option<Self>> {
        let mut literal = PathBuf::new();
        let mut rest: Vec<String> = Vec::new();
        for component in Path::new(pattern).components() {
            let text = component.as_os_str().to_string_lossy();
            if rest.is_empty() && !is_glob(&text) {
                literal.push(component.as_os_str());
            } else {
                rest.push(text.into_owned());
            }
        }

        if rest.is_empty() {
            return Ok(None);
        }

        let matcher = GlobBuilder::new(&rest.join("/"))
            .literal_separator(true)
            .build()?
            .compile_matcher();

        Ok(Some(Self {
            base: normalize(base, literal),
            matcher,
        }))
    }

    /// Directory the pattern is relative to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn is_match(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.base) {
            Ok(rel) if !rel.as_os_str().is_empty() => self
                .matcher
                .is_match(rel.to_string_lossy().replace('\\', "/")),
            _ => false,
        }
    }
}
