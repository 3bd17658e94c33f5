// src/exec/runner.rs

//! Streaming runner for the primary build tool invocation.

use std::io::{BufRead, PipeReader};
use std::process::Stdio;

use anyhow::{Context, anyhow};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, XctaskError};
use crate::exec::command::{CommandSpec, ExecutionOutcome, ExitInfo, UNBUFFERED_IO_ENV};

pub type BeforeHook = Box<dyn Fn() + Send + Sync>;
pub type AfterHook = Box<dyn Fn(&[String], &ExitInfo) + Send + Sync>;

/// Optional callbacks around a run.
///
/// `before` fires before the process is launched. `after` fires only when the
/// primary process succeeded, with the captured lines and its status.
#[derive(Default)]
pub struct RunnerHooks {
    pub before: Option<BeforeHook>,
    pub after: Option<AfterHook>,
}

impl RunnerHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.before = Some(Box::new(hook));
        self
    }

    pub fn after(mut self, hook: impl Fn(&[String], &ExitInfo) + Send + Sync + 'static) -> Self {
        self.after = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for RunnerHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerHooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct CommandRunner {
    hooks: RunnerHooks,
}

impl CommandRunner {
    pub fn new(hooks: RunnerHooks) -> Self {
        Self { hooks }
    }

    /// Run `spec` (piped through `formatter` if given) and fail unless the
    /// primary process exits successfully.
    ///
    /// On failure the `after` hook is skipped and whatever was already
    /// printed stays printed.
    pub async fn execute(
        &self,
        spec: &CommandSpec,
        formatter: Option<&str>,
    ) -> Result<ExecutionOutcome> {
        let outcome = self.run(spec, formatter).await?;

        if !outcome.status.success {
            error!(
                exit_code = outcome.status.code,
                cmd = %spec.command_line(),
                "build tool failed"
            );
            return Err(XctaskError::ExecutionFailed {
                code: outcome.status.code,
                command: spec.command_line(),
            });
        }

        if let Some(after) = &self.hooks.after {
            after(&outcome.lines, &outcome.status);
        }

        Ok(outcome)
    }

    /// Run `spec` and report its outcome without judging the exit status.
    ///
    /// Only a failure to launch (or to wait on) a process is an error here.
    pub async fn run(
        &self,
        spec: &CommandSpec,
        formatter: Option<&str>,
    ) -> Result<ExecutionOutcome> {
        if let Some(before) = &self.hooks.before {
            before();
        }

        let shown = spec.display_line(formatter);
        println!("{shown}");
        info!(cmd = %shown, "starting build tool");

        let outcome = match formatter {
            None => run_merged(spec).await?,
            Some(formatter) => run_formatted(spec, formatter).await?,
        };

        info!(
            exit_code = outcome.status.code,
            success = outcome.status.success,
            lines = outcome.lines.len(),
            "build tool exited"
        );

        Ok(outcome)
    }
}

fn build_command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(spec.program());
    cmd.args(spec.arguments());
    if spec.clears_env() {
        cmd.env_clear();
    }
    cmd.envs(spec.env_overrides());
    cmd.env(UNBUFFERED_IO_ENV.0, UNBUFFERED_IO_ENV.1);
    cmd
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

/// stdout and stderr share one OS pipe, so lines arrive in the order the
/// child wrote them.
async fn run_merged(spec: &CommandSpec) -> Result<ExecutionOutcome> {
    let (reader, stdout_writer) = std::io::pipe().context("creating output pipe")?;
    let stderr_writer = stdout_writer
        .try_clone()
        .context("cloning output pipe")?;

    let mut cmd = build_command(spec);
    cmd.stdout(stdout_writer)
        .stderr(stderr_writer)
        .kill_on_drop(true);

    let spawned = cmd.spawn();
    // The command keeps its copies of the write end; the reader only sees EOF
    // once they are gone.
    drop(cmd);
    let mut child = spawned.map_err(|source| XctaskError::Spawn {
        program: spec.program().to_string(),
        source,
    })?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let forwarder = tokio::task::spawn_blocking(move || forward_pipe_lines(reader, tx));

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        println!("{line}");
        lines.push(line);
    }
    forwarder.await.context("joining output reader")?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process '{}'", spec.program()))?;

    Ok(ExecutionOutcome {
        status: ExitInfo::from(status),
        lines,
    })
}

/// Primary stdout is handed to the formatter as its stdin at the OS level;
/// what gets printed and captured is the formatter's stdout. The primary's
/// stderr is inherited.
async fn run_formatted(spec: &CommandSpec, formatter: &str) -> Result<ExecutionOutcome> {
    let mut primary_cmd = build_command(spec);
    primary_cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut primary = primary_cmd.spawn().map_err(|source| XctaskError::Spawn {
        program: spec.program().to_string(),
        source,
    })?;

    let primary_stdout = primary
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout of '{}' was not captured", spec.program()))?;
    let formatter_stdin: Stdio = primary_stdout
        .try_into()
        .context("connecting build tool stdout to formatter")?;

    let mut formatter_cmd = shell_command(formatter);
    formatter_cmd
        .stdin(formatter_stdin)
        .stdout(Stdio::piped())
        .kill_on_drop(true);

    let mut formatter_child = formatter_cmd.spawn().map_err(|source| XctaskError::Spawn {
        program: formatter.to_string(),
        source,
    })?;

    let program = spec.program().to_string();
    let primary_wait = tokio::spawn(async move {
        primary
            .wait()
            .await
            .with_context(|| format!("waiting for process '{program}'"))
    });

    let mut lines = Vec::new();
    if let Some(stdout) = formatter_child.stdout.take() {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = read_line_lossy(&mut reader, &mut buf).await {
            println!("{line}");
            lines.push(line);
        }
    }

    let formatter_status = formatter_child
        .wait()
        .await
        .with_context(|| format!("waiting for formatter '{formatter}'"))?;
    let primary_status = primary_wait
        .await
        .context("joining build tool wait task")??;

    if !formatter_status.success() {
        warn!(
            formatter = %formatter,
            exit_code = formatter_status.code().unwrap_or(-1),
            "formatter exited unsuccessfully; outcome follows the build tool"
        );
    }

    Ok(ExecutionOutcome {
        status: ExitInfo::from(primary_status),
        lines,
    })
}

/// Blocking read of the merged pipe, one message per line.
fn forward_pipe_lines(reader: PipeReader, tx: mpsc::UnboundedSender<String>) {
    let mut reader = std::io::BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(decode_line(&mut buf)).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "stopped reading process output");
                break;
            }
        }
    }
}

/// Next line without its terminator, decoded lossily; `None` at EOF.
///
/// Invalid UTF-8 must not stop the reader, or the child could block on a full
/// pipe.
async fn read_line_lossy<R>(reader: &mut BufReader<R>, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    match reader.read_until(b'\n', buf).await {
        Ok(0) => None,
        Ok(_) => Some(decode_line(buf)),
        Err(e) => {
            debug!(error = %e, "stopped reading process output");
            None
        }
    }
}

fn decode_line(buf: &mut Vec<u8>) -> String {
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    String::from_utf8_lossy(buf).into_owned()
}
