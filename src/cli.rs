// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::BuildMode;

/// Command-line arguments for `dagmake`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagmake",
    version,
    about = "Rebuild files whose inputs changed, following Dagmake.toml specs.",
    long_about = None
)]
pub struct CliArgs {
    /// Files (or globs) to build, relative to the current directory.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Rebuild the whole dependency closure regardless of timestamps.
    #[arg(short, long, conflicts_with = "clean")]
    pub force: bool,

    /// Delete the declared outputs of the targets and their dependencies.
    #[arg(short, long)]
    pub clean: bool,

    /// List buildable targets grouped by tag, optionally filtered by a path
    /// or glob.
    #[arg(short, long, value_name = "FILTER", num_args = 0..=1)]
    pub list: Option<Option<String>>,

    /// Print the dependency tree of each target instead of building.
    #[arg(short = 't', long)]
    pub show_tree: bool,

    /// Shorthand for `--log-level debug`.
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGMAKE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Plaintext log of every action and its output.
    #[arg(long, value_name = "PATH", default_value = "dagmake.log")]
    pub log_file: PathBuf,

    /// Do not write a log file.
    #[arg(long)]
    pub no_log_file: bool,

    /// Warn about undeclared reads and writes of every action.
    #[arg(long)]
    pub track_changes: bool,
}

impl CliArgs {
    pub fn mode(&self) -> BuildMode {
        if self.clean {
            BuildMode::Clean
        } else if self.force {
            BuildMode::Force
        } else {
            BuildMode::Normal
        }
    }

    /// Effective terminal log level; `--log-level` wins over `--verbose`.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        match (self.log_level, self.verbose) {
            (Some(level), _) => Some(level),
            (None, true) => Some(LogLevel::Debug),
            (None, false) => None,
        }
    }

    pub fn log_file(&self) -> Option<&std::path::Path> {
        (!self.no_log_file).then_some(self.log_file.as_path())
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
