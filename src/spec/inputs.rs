// src/spec/inputs.rs

//! Resolution of declared inputs: literal paths and glob patterns.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::dag::paths::{RelativeGlob, is_glob, normalize};
use crate::errors::Result;
use crate::spec::model::SPEC_FILE_NAME;

/// One input after resolution.
///
/// `declared` is what the spec author wrote for literal inputs, and the
/// matched absolute path for glob expansions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub declared: String,
    pub path: PathBuf,
}

/// Resolve every declared input against `root`, expanding globs.
///
/// An input that exists on disk as written is always literal, so names like
/// `data[1].csv` are not mistaken for patterns. A pattern without `*` that
/// matches nothing is kept as a literal dependency and surfaces later as a
/// missing dependency instead of silently disappearing.
pub fn resolve_inputs(root: &Path, declared: &[String]) -> Result<Vec<ResolvedInput>> {
    let mut resolved = Vec::with_capacity(declared.len());

    for input in declared {
        let literal = normalize(root, input);
        if is_glob(input) && !literal.exists() {
            let matches = expand_glob(root, input)?;
            if !matches.is_empty() || input.contains('*') {
                resolved.extend(matches.into_iter().map(|path| ResolvedInput {
                    declared: path.to_string_lossy().into_owned(),
                    path,
                }));
                continue;
            }
            debug!(input = %input, "pattern matched nothing; keeping it as a literal input");
        }
        resolved.push(ResolvedInput {
            declared: input.clone(),
            path: literal,
        });
    }

    Ok(resolved)
}

/// Expand `pattern` (relative to `root`) against the filesystem.
///
/// `*` does not cross directory separators; `**` does. Spec files are never
/// returned. Results are sorted.
pub fn expand_glob(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let Some(glob) = RelativeGlob::new(root, pattern)? else {
        let literal = normalize(root, pattern);
        return Ok(if literal.exists() { vec![literal] } else { Vec::new() });
    };

    let mut matches = Vec::new();
    if !glob.base().is_dir() {
        trace!(base = %glob.base().display(), pattern, "glob base does not exist; no matches");
        return Ok(matches);
    }

    let mut stack = vec![glob.base().to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            // Symlinked directories are matched but not descended into.
            let is_dir = entry.file_type()?.is_dir();
            let path = entry.path();

            let is_spec = path.file_name().is_some_and(|n| n == SPEC_FILE_NAME);
            if !is_spec && glob.is_match(&path) {
                matches.push(path.clone());
            }

            if is_dir {
                stack.push(path);
            }
        }
    }

    matches.sort();
    Ok(matches)
}
