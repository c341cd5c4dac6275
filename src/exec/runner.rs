// src/exec/runner.rs

//! The process runner: spawn, pump output, guard, wait, classify.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::errors::ExecError;
use crate::exec::classify::{ExitInput, WaitOutcome, classify};
use crate::exec::command::{CommandSpec, ExecutionResult, OutputSink, OutputSinks};
use crate::exec::guards::{CancellationGuard, TimeoutGuard};
use crate::exec::handle::{KillRequest, ProcessHandle};
use crate::exec::platform::{self, ProcessControl};

/// Runs one command at a time to completion, under a cancel flag and a
/// timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    control: Arc<dyn ProcessControl>,
}

impl ProcessRunner {
    /// Runner using the native process control for this platform.
    pub fn new() -> Self {
        Self::with_control(platform::native())
    }

    pub fn with_control(control: Arc<dyn ProcessControl>) -> Self {
        Self { control }
    }

    /// Execute `spec`, streaming its output into `sinks`.
    ///
    /// Never returns early: by the time this resolves the child has been
    /// reaped, both guards have been joined and both output streams have
    /// been drained into their sinks.
    pub async fn execute(
        &self,
        spec: &CommandSpec,
        sinks: OutputSinks,
        cancel: Arc<dyn CancelSignal>,
    ) -> ExecutionResult {
        if spec.timeout_seconds <= 0 {
            return ExecutionResult::failed(ExecError::InvalidTimeout(spec.timeout_seconds));
        }
        let timeout = Duration::from_secs(spec.timeout_seconds as u64);

        let mut cmd = self.build_command(spec);
        let started = Instant::now();

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(program = %spec.program, error = %source, "failed to spawn process");
                return ExecutionResult::failed(ExecError::Spawn {
                    program: spec.program.clone(),
                    source,
                });
            }
        };

        let pid = child.id();
        info!(
            program = %spec.program,
            args = ?spec.args,
            pid = ?pid,
            timeout_secs = spec.timeout_seconds,
            "process started"
        );

        let pumps = [
            pump(child.stdout.take(), sinks.stdout, "stdout"),
            pump(child.stderr.take(), sinks.stderr, "stderr"),
        ];

        let (handle, kill_rx) = ProcessHandle::channel(pid);
        let cancel_guard = CancellationGuard::spawn(Arc::clone(&cancel), handle.clone());
        let timeout_guard = TimeoutGuard::arm(timeout, handle);

        let settled = self.settle(&mut child, pid, pumps, kill_rx).await;

        // Process is reaped and both pipes are closed; only now are the
        // guards out of work.
        let timer_stopped = timeout_guard.stop();
        let timeout_outcome = timeout_guard.join().await;
        let cancel_outcome = cancel_guard.stop().await;
        debug!(
            timer_stopped,
            timeout = ?timeout_outcome,
            cancel = ?cancel_outcome,
            "guards settled"
        );

        let mut result = classify(ExitInput {
            wait: WaitOutcome::from(settled.wait),
            cancel: cancel_outcome,
            timeout: timeout_outcome,
            flag: cancel.state(),
        });
        result.errors.extend(settled.pump_errors);

        info!(
            program = %spec.program,
            pid = ?pid,
            exit_code = result.exit_code,
            errors = result.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "process finished"
        );

        result
    }

    fn build_command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.control.prepare(&mut cmd);
        cmd
    }

    /// Wait for the child to be reaped and both output streams to reach
    /// EOF, answering kill requests from the guards the whole time.
    ///
    /// Descendants that inherited the pipes can keep them open long after
    /// the child itself exited, so the guards must still be able to reach
    /// the tree until the last pump is done. Kills and the final reap happen
    /// in this one loop, so a request that arrives afterwards is dropped
    /// (the guard sees "already exited").
    async fn settle(
        &self,
        child: &mut Child,
        root_pid: Option<u32>,
        pumps: [JoinHandle<Result<u64, ExecError>>; 2],
        mut kill_rx: mpsc::Receiver<KillRequest>,
    ) -> Settled {
        let [mut stdout_pump, mut stderr_pump] = pumps;
        let mut wait = None;
        let mut stdout_done = None;
        let mut stderr_done = None;

        while wait.is_none() || stdout_done.is_none() || stderr_done.is_none() {
            tokio::select! {
                status = child.wait(), if wait.is_none() => {
                    debug!(pid = ?root_pid, ?status, "process reaped");
                    wait = Some(status);
                }
                pumped = &mut stdout_pump, if stdout_done.is_none() => {
                    stdout_done = Some(pumped);
                }
                pumped = &mut stderr_pump, if stderr_done.is_none() => {
                    stderr_done = Some(pumped);
                }
                Some(request) = kill_rx.recv() => {
                    debug!(cause = %request.cause, "kill requested");
                    let result = self.control.kill(child, root_pid);
                    let _ = request.reply.send(result);
                }
            }
        }

        let mut pump_errors = Vec::new();
        for (stream, pumped) in [("stdout", stdout_done), ("stderr", stderr_done)] {
            match pumped {
                Some(Ok(Ok(_))) | None => {}
                Some(Ok(Err(e))) => pump_errors.push(e),
                Some(Err(e)) => {
                    warn!(stream, error = %e, "output pump task failed");
                    pump_errors.push(ExecError::Io {
                        stream,
                        source: std::io::Error::other(format!("output pump task failed: {e}")),
                    });
                }
            }
        }

        Settled {
            wait: wait.unwrap_or_else(|| Err(std::io::Error::other("process was never reaped"))),
            pump_errors,
        }
    }
}

/// What [`ProcessRunner::settle`] observed.
struct Settled {
    wait: std::io::Result<std::process::ExitStatus>,
    pump_errors: Vec<ExecError>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy one of the child's streams into its sink until EOF.
fn pump<R>(
    reader: Option<R>,
    mut sink: OutputSink,
    stream: &'static str,
) -> JoinHandle<Result<u64, ExecError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return Ok(0);
        };
        let copied = tokio::io::copy(&mut reader, &mut sink)
            .await
            .map_err(|source| ExecError::Io { stream, source })?;
        sink.flush()
            .await
            .map_err(|source| ExecError::Io { stream, source })?;
        debug!(stream, bytes = copied, "output stream drained");
        Ok(copied)
    })
}
