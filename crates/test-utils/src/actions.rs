use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use dagmake::exec::{Action, ActionContext, ActionFuture};

/// One recorded action invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub action: String,
    pub ctx: ActionContext,
}

/// Shared log of action invocations, handing out actions that write their
/// outputs and record themselves.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Action that writes every output and records the call.
    pub fn action(&self, name: &str) -> Arc<dyn Action> {
        Arc::new(RecordingAction {
            name: name.to_string(),
            calls: Arc::clone(&self.calls),
            skip: None,
        })
    }

    /// Like [`Recorder::action`], but never writes outputs named `skip`.
    pub fn action_skipping(&self, name: &str, skip: &str) -> Arc<dyn Action> {
        Arc::new(RecordingAction {
            name: name.to_string(),
            calls: Arc::clone(&self.calls),
            skip: Some(skip.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Action names in invocation order.
    pub fn names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.action).collect()
    }
}

#[derive(Debug)]
struct RecordingAction {
    name: String,
    calls: Arc<Mutex<Vec<Call>>>,
    skip: Option<String>,
}

impl Action for RecordingAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call {
                action: self.name.clone(),
                ctx: ctx.clone(),
            });

            for output in &ctx.outputs {
                let skipped = self
                    .skip
                    .as_deref()
                    .is_some_and(|skip| output.file_name().is_some_and(|n| n == skip));
                if !skipped {
                    tokio::fs::write(output, format!("built by {}\n", self.name)).await?;
                }
            }
            Ok(())
        })
    }
}

/// Always fails with `message`.
#[derive(Debug)]
pub struct FailingAction {
    pub message: String,
}

impl FailingAction {
    pub fn new(message: &str) -> Arc<dyn Action> {
        Arc::new(Self {
            message: message.to_string(),
        })
    }
}

impl Action for FailingAction {
    fn name(&self) -> &str {
        "failing"
    }

    fn run<'a>(&'a self, _ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move { bail!("{}", self.message) })
    }
}

/// Sleeps for `duration` and then succeeds without writing anything.
#[derive(Debug)]
pub struct SleepingAction {
    pub duration: Duration,
}

impl SleepingAction {
    pub fn new(duration: Duration) -> Arc<dyn Action> {
        Arc::new(Self { duration })
    }
}

impl Action for SleepingAction {
    fn name(&self) -> &str {
        "sleeping"
    }

    fn run<'a>(&'a self, _ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            tokio::time::sleep(self.duration).await;
            Ok(())
        })
    }
}
