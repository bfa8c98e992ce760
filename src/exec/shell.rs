// src/exec/shell.rs

//! Shell command action used by rules loaded from spec files.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::{Context, bail};
use regex::{Captures, Regex};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::action::{Action, ActionContext, ActionFuture};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(ins|outs|in|out)\}").expect("placeholder regex is valid"));

/// Lines of stderr kept for failure messages.
const STDERR_TAIL: usize = 20;

/// Runs `cmd` through `shell` in the rule's directory.
#[derive(Debug, Clone)]
pub struct ShellAction {
    name: String,
    cmd: String,
    shell: String,
}

impl ShellAction {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, shell: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            shell: shell.into(),
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Substitute `{ins}`, `{outs}`, `{in}` and `{out}`. Other braces are
    /// left untouched so shell syntax like `${HOME}` survives.
    pub fn render(&self, ctx: &ActionContext) -> String {
        PLACEHOLDER
            .replace_all(&self.cmd, |caps: &Captures| match &caps[1] {
                "ins" => join_quoted(&ctx.inputs),
                "outs" => join_quoted(&ctx.outputs),
                "in" => ctx.inputs.first().map(|p| shell_quote(p)).unwrap_or_default(),
                "out" => ctx.outputs.first().map(|p| shell_quote(p)).unwrap_or_default(),
                _ => caps[0].to_string(),
            })
            .into_owned()
    }

    fn command(&self, script: &str, working_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.shell);
        let flag = match shell_name(&self.shell).as_str() {
            "cmd" | "cmd.exe" => "/C",
            "powershell" | "powershell.exe" | "pwsh" | "pwsh.exe" => "-Command",
            _ => "-c",
        };
        cmd.arg(flag).arg(script).current_dir(working_dir);
        cmd
    }
}

impl Action for ShellAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn run<'a>(&'a self, ctx: &'a ActionContext) -> ActionFuture<'a> {
        Box::pin(async move {
            let script = self.render(ctx);
            info!(
                action = %self.name,
                cwd = %ctx.working_dir.display(),
                cmd = %script,
                "running command"
            );

            let mut cmd = self.command(&script, &ctx.working_dir);
            if ctx.stream {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            } else {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            cmd.kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning `{}` for '{}'", self.shell, self.name))?;

            let stdout_task = child
                .stdout
                .take()
                .map(|out| tokio::spawn(capture_lines(out, self.name.clone(), "stdout")));
            let stderr_task = child
                .stderr
                .take()
                .map(|err| tokio::spawn(capture_lines(err, self.name.clone(), "stderr")));

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for command of '{}'", self.name))?;

            if let Some(task) = stdout_task {
                let _ = task.await;
            }
            let stderr_tail = match stderr_task {
                Some(task) => task.await.unwrap_or_default(),
                None => Vec::new(),
            };

            debug!(
                action = %self.name,
                exit_code = status.code().unwrap_or(-1),
                success = status.success(),
                "command exited"
            );

            if !status.success() {
                let code = status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                if stderr_tail.is_empty() {
                    bail!("command `{script}` exited with status {code}");
                }
                bail!(
                    "command `{script}` exited with status {code}:\n{}",
                    stderr_tail.join("\n")
                );
            }

            Ok(())
        })
    }
}

/// Log every line at debug level and keep the last few.
async fn capture_lines<R>(reader: R, action: String, stream: &'static str) -> Vec<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "dagmake::action", action = %action, stream, "{}", line);
        if tail.len() == STDERR_TAIL {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    tail.into_iter().collect()
}

fn shell_name(shell: &str) -> String {
    Path::new(shell)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| shell.to_lowercase())
}

fn join_quoted(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| shell_quote(p)).collect::<Vec<_>>().join(" ")
}

/// Quote a path for the shell if it contains anything but safe characters.
pub fn shell_quote(path: &Path) -> String {
    let text = path.to_string_lossy();
    let safe = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c) || (cfg!(windows) && c == '\\'));
    if safe {
        return text.into_owned();
    }
    if cfg!(windows) {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        format!("'{}'", text.replace('\'', "'\\''"))
    }
}
