// src/exec/mod.rs

//! Execution layer.
//!
//! - [`action`] defines the `Action` trait and the context passed to it.
//! - [`shell`] runs spec-file commands with `tokio::process::Command`.
//! - [`plan`] turns requested targets into an ordered execution list.
//! - [`executor`] runs a plan one node at a time and verifies outputs.
//! - [`interrupt`] lets Ctrl-C (or a test) stop a running build.
//! - [`change_tracker`] reports undeclared reads and writes around an action.

pub mod action;
pub mod change_tracker;
pub mod executor;
pub mod interrupt;
pub mod plan;
pub mod shell;

pub use action::{Action, ActionContext, ActionFuture, FnAction, action_fn};
pub use change_tracker::{ChangeReport, ChangeTracker};
pub use executor::{BuildSummary, Executor};
pub use interrupt::{Interrupt, InterruptHandle};
pub use plan::{Plan, PlanStep, resolve_targets};
pub use shell::{ShellAction, shell_quote};
