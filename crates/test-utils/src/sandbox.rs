use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// A temporary project directory with helpers for files and timestamps.
///
/// The root is canonicalized so paths compare equal to the ones specs and
/// graphs produce.
pub struct Sandbox {
    _dir: TempDir,
    root: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = fs::canonicalize(dir.path()).expect("canonicalize tempdir");
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    /// Set the modification time of `rel`.
    pub fn set_mtime(&self, rel: &str, time: SystemTime) {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(self.path(rel))
            .expect("open file for mtime");
        file.set_modified(time).expect("set mtime");
    }

    /// Make `rel` look `secs` seconds old.
    pub fn age(&self, rel: &str, secs: u64) {
        self.set_mtime(rel, SystemTime::now() - Duration::from_secs(secs));
    }

    pub fn mtime(&self, rel: &str) -> SystemTime {
        fs::metadata(self.path(rel))
            .and_then(|m| m.modified())
            .expect("read mtime")
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}
