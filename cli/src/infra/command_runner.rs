//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution. Nothing is timed out: terraform and ansible
//! runs routinely take tens of minutes.

use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::application::ports::CommandRunner;

/// Production `CommandRunner` backed by `tokio::process`.
///
/// Children are killed if the runner's future is dropped (e.g. on Ctrl-C).
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn wait_inherited(
        mut command: tokio::process::Command,
        program: &str,
    ) -> Result<ExitStatus> {
        let mut child = command
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        debug!(program, ?args, "running");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        // Drain both pipes while waiting so a chatty child never blocks on a
        // full pipe buffer.
        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stdout_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
            async {
                let mut buf = Vec::new();
                if let Some(ref mut h) = stderr_handle {
                    let _ = h.read_to_end(&mut buf).await;
                }
                buf
            },
        );
        Ok(Output {
            status: status.with_context(|| format!("waiting for {program}"))?,
            stdout,
            stderr,
        })
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        debug!(program, ?args, "running");
        let mut command = tokio::process::Command::new(program);
        command.args(args);
        Self::wait_inherited(command, program).await
    }

    async fn run_status_in(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
    ) -> Result<ExitStatus> {
        debug!(program, ?args, dir = %dir.display(), "running");
        let mut command = tokio::process::Command::new(program);
        command.args(args).current_dir(dir);
        Self::wait_inherited(command, program).await
    }
}
