// src/exec/action.rs

//! The unit of work behind every declared output.
//!
//! Actions receive everything they need through an explicit
//! [`ActionContext`]; nothing is read from process-global state such as the
//! current directory.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// Inputs, outputs and working directory for one action invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    /// Node that triggered the invocation.
    pub node: PathBuf,
    /// Resolved absolute input paths.
    pub inputs: Vec<PathBuf>,
    /// Resolved absolute output paths (every output of the rule).
    pub outputs: Vec<PathBuf>,
    /// Directory of the spec that declared the rule.
    pub working_dir: PathBuf,
    /// Stream output to the terminal instead of capturing it into the log.
    pub stream: bool,
}

/// Something that produces a rule's outputs.
///
/// Production specs use [`ShellAction`](crate::exec::ShellAction); code and
/// tests can register any implementation, e.g. via [`action_fn`].
pub trait Action: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Run once. Errors are reported as build failures of the node.
    fn run<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a>;
}

/// Adapter turning a synchronous closure into an [`Action`].
pub struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&ActionContext) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move { (self.f)(ctx) })
    }
}

/// Wrap a closure as a shareable action.
pub fn action_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Action>
where
    F: Fn(&ActionContext) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnAction {
        name: name.into(),
        f,
    })
}
