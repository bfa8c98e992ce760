// src/spec/template.rs

//! Per-input output templates such as `build/{stem}.o`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

use crate::dag::paths::display_relative;
use crate::errors::{DagmakeError, Result};
use crate::spec::OutputFn;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z]+)\}").expect("placeholder regex is valid"));

const KNOWN: &[&str] = &["path", "dir", "name", "stem", "ext", "rel", "reldir"];

/// A validated output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTemplate {
    raw: String,
}

impl OutputTemplate {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(DagmakeError::Config("output_template must not be empty".to_string()));
        }
        for caps in PLACEHOLDER.captures_iter(raw) {
            let name = &caps[1];
            if !KNOWN.contains(&name) {
                return Err(DagmakeError::Config(format!(
                    "unknown placeholder '{{{name}}}' in output_template '{raw}' (known: {})",
                    KNOWN.join(", ")
                )));
            }
        }
        Ok(Self { raw: raw.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Render the template for one absolute `input`, with `{rel}` and
    /// `{reldir}` relative to `root`.
    pub fn render(&self, input: &Path, root: &Path) -> PathBuf {
        let rendered = PLACEHOLDER.replace_all(&self.raw, |caps: &Captures| {
            placeholder_value(&caps[1], input, root).unwrap_or_else(|| caps[0].to_string())
        });
        PathBuf::from(rendered.into_owned())
    }

    /// Turn the template into an output function bound to `root`.
    pub fn into_output_fn(self, root: PathBuf) -> OutputFn {
        Arc::new(move |input: &Path| self.render(input, &root))
    }
}

fn placeholder_value(name: &str, input: &Path, root: &Path) -> Option<String> {
    let lossy = |p: Option<&std::ffi::OsStr>| p.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let value = match name {
        "path" => input.to_string_lossy().into_owned(),
        "dir" => input
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default(),
        "name" => lossy(input.file_name()),
        "stem" => lossy(input.file_stem()),
        "ext" => lossy(input.extension()),
        "rel" => display_relative(root, input),
        "reldir" => match input.parent() {
            Some(parent) if parent != root => display_relative(root, parent),
            _ => ".".to_string(),
        },
        _ => return None,
    };
    Some(value)
}
