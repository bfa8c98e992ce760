use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How the executor treats the transitive closure of a target.
///
/// - `Normal`: rebuild only what is stale relative to the target.
/// - `Force`: rebuild the whole closure regardless of timestamps.
/// - `Clean`: delete the declared outputs of the whole closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Normal,
    Force,
    Clean,
}

impl Default for BuildMode {
    fn default() -> Self {
        BuildMode::Normal
    }
}

impl BuildMode {
    /// Force and clean both bypass staleness filtering.
    pub fn uses_full_closure(self) -> bool {
        matches!(self, BuildMode::Force | BuildMode::Clean)
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "build" => Ok(BuildMode::Normal),
            "force" => Ok(BuildMode::Force),
            "clean" => Ok(BuildMode::Clean),
            other => Err(format!(
                "invalid build mode: {other} (expected \"normal\", \"force\" or \"clean\")"
            )),
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildMode::Normal => "build",
            BuildMode::Force => "force",
            BuildMode::Clean => "clean",
        };
        f.write_str(s)
    }
}

/// Lifecycle of one executor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Planning,
    Executing,
    Done,
    Failed,
}
