// src/exec/command.rs

use std::process::Stdio;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::exec::hook::{HookFuture, ModuleHook};
use crate::options::ModuleOptions;

/// Production hook: runs the module's command through the platform shell
/// in the module's working directory.
///
/// The child is killed when the run is cancelled (and on drop, so no
/// process outlives the scheduler).
pub struct CommandHook;

impl ModuleHook for CommandHook {
    fn run<'a>(&'a self, ctx: CancellationToken, opts: &'a ModuleOptions) -> HookFuture<'a> {
        Box::pin(run_command(ctx, opts))
    }
}

async fn run_command(ctx: CancellationToken, opts: &ModuleOptions) -> anyhow::Result<()> {
    info!(
        dir = %opts.working_dir.display(),
        cmd = %opts.command,
        "starting module command"
    );

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&opts.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&opts.command);
        c
    };

    cmd.current_dir(&opts.working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning command in '{}'", opts.working_dir.display()))?;

    // Stream both pipes so buffers never fill.
    if let Some(stdout) = child.stdout.take() {
        let dir = opts.working_dir.display().to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(dir = %dir, "stdout: {}", line);
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        let dir = opts.working_dir.display().to_string();
        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(dir = %dir, "stderr: {}", line);
            }
        });
    }

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res.with_context(|| {
                format!("waiting for command in '{}'", opts.working_dir.display())
            })?;

            let code = status.code().unwrap_or(-1);
            info!(
                dir = %opts.working_dir.display(),
                exit_code = code,
                success = status.success(),
                "module command exited"
            );

            if status.success() {
                Ok(())
            } else {
                Err(anyhow!("command exited with status {code}"))
            }
        }

        _ = ctx.cancelled() => {
            info!(
                dir = %opts.working_dir.display(),
                "run cancelled; killing module command"
            );
            if let Err(e) = child.kill().await {
                warn!(
                    dir = %opts.working_dir.display(),
                    error = %e,
                    "failed to kill child process on cancellation"
                );
            }
            Err(anyhow!("command cancelled before completion"))
        }
    }
}
