// src/discovery/locator.rs

//! Finding spec files on disk.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::errors::Result;
use crate::spec::SPEC_FILE_NAME;

/// Governing-spec lookups, memoized per directory.
#[derive(Debug, Default)]
pub struct SpecLocator {
    cache: HashMap<PathBuf, Option<PathBuf>>,
}

impl SpecLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The nearest spec file at or above `path`, canonicalized.
    pub fn find_governing_spec(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        let mut pending: Vec<PathBuf> = Vec::new();
        let mut found: Option<PathBuf> = None;

        for dir in path.ancestors() {
            if let Some(cached) = self.cache.get(dir) {
                found = cached.clone();
                break;
            }

            pending.push(dir.to_path_buf());
            let candidate = dir.join(SPEC_FILE_NAME);
            if candidate.is_file() {
                found = Some(fs::canonicalize(&candidate)?);
                break;
            }
        }

        trace!(
            path = %path.display(),
            spec = ?found,
            scanned = pending.len(),
            "governing spec lookup"
        );

        for dir in pending {
            self.cache.insert(dir, found.clone());
        }
        Ok(found)
    }

    pub fn cached_dirs(&self) -> usize {
        self.cache.len()
    }
}

/// Every spec file below `dir` plus those in its ancestors, sorted.
///
/// Hidden directories and `target` are not descended into.
pub fn find_all_specs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut specs: BTreeSet<PathBuf> = BTreeSet::new();

    for ancestor in dir.ancestors().skip(1) {
        let candidate = ancestor.join(SPEC_FILE_NAME);
        if candidate.is_file() {
            specs.insert(fs::canonicalize(&candidate)?);
        }
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(e) if current == dir => return Err(e.into()),
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with('.') || name == "target" {
                    continue;
                }
                stack.push(path);
            } else if entry.file_name() == SPEC_FILE_NAME {
                specs.insert(fs::canonicalize(&path)?);
            }
        }
    }

    Ok(specs.into_iter().collect())
}
