// src/spec/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::spec::Spec;
use crate::spec::model::{RawSpecFile, SpecFile};

/// Read a spec file and deserialize it, without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSpecFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let spec: RawSpecFile = toml::from_str(&contents)?;

    Ok(spec)
}

/// Read a spec file, apply defaults and validate every rule.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SpecFile> {
    let raw = load_from_path(&path)?;
    let spec = SpecFile::try_from(raw)?;
    Ok(spec)
}

/// Load a spec file into a [`Spec`] rooted at the file's directory.
pub fn load_spec(path: impl AsRef<Path>) -> Result<Spec> {
    let path = fs::canonicalize(path.as_ref())?;
    let file = load_and_validate(&path)?;
    debug!(spec = %path.display(), rules = file.rule.len(), "loaded spec");
    Spec::from_file(&path, file)
}
