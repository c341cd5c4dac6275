// src/exec/classify.rs

//! Exit classification.
//!
//! Pure function from "how did the wait end, and what did the guards do" to
//! an [`ExecutionResult`]. No Tokio, no processes: everything here is
//! unit-testable with plain values.
//!
//! A raw exit code of `-1` is read as "killed by a signal". On POSIX that is
//! what `ExitStatus::code()` returning `None` means, but any other cause that
//! surfaces as `-1` is treated the same way. It is an approximation, kept
//! because callers depend on it.

use std::io;
use std::process::ExitStatus;

use tracing::{info, warn};

use crate::cancel::CancelState;
use crate::errors::{ExecError, StopCause};
use crate::exec::command::{
    ERROR_EXIT_CODE, ExecutionResult, STOPPED_PREEMPTIVELY_EXIT_CODE, SUCCESS_EXIT_CODE,
};
use crate::exec::guards::GuardOutcome;

/// Raw exit code standing for "terminated by a signal".
pub const KILLED_BY_SIGNAL: i32 = -1;

/// How waiting on the child ended.
#[derive(Debug)]
pub enum WaitOutcome {
    /// The process exited and its status is known.
    ///
    /// `code` is `None` when there is no exit code (killed by a signal).
    Exited { success: bool, code: Option<i32> },
    /// Waiting failed and no status could be obtained.
    Failed(io::Error),
}

impl From<io::Result<ExitStatus>> for WaitOutcome {
    fn from(result: io::Result<ExitStatus>) -> Self {
        match result {
            Ok(status) => WaitOutcome::Exited {
                success: status.success(),
                code: status.code(),
            },
            Err(e) => WaitOutcome::Failed(e),
        }
    }
}

/// Everything the classifier looks at.
#[derive(Debug)]
pub struct ExitInput {
    pub wait: WaitOutcome,
    pub cancel: GuardOutcome,
    pub timeout: GuardOutcome,
    /// Cancel flag state at classification time.
    pub flag: CancelState,
}

/// Reconcile natural exit, cancel-kill and timeout-kill into one result.
pub fn classify(input: ExitInput) -> ExecutionResult {
    let ExitInput {
        wait,
        cancel,
        timeout,
        flag,
    } = input;

    let cancel_fired = cancel.fired();
    let timeout_fired = timeout.fired();
    let guard_killed = cancel.killed() || timeout.killed();
    let interrupted = cancel.interrupted() || timeout.interrupted();
    let cause = stop_cause(&cancel, &timeout);

    let mut errors = Vec::new();
    if let GuardOutcome::KillFailed(source) = cancel {
        errors.push(ExecError::Kill {
            cause: StopCause::Canceled,
            source,
        });
    }
    if let GuardOutcome::KillFailed(source) = timeout {
        errors.push(ExecError::Kill {
            cause: StopCause::TimedOut,
            source,
        });
    }

    let exit_code = match wait {
        WaitOutcome::Exited { success, code } => {
            let raw = match code {
                Some(code) => code,
                None if success => SUCCESS_EXIT_CODE,
                None => KILLED_BY_SIGNAL,
            };
            let guard_fired = cancel_fired || timeout_fired;

            // A landed kill means the tree was still running (the leader, or
            // descendants holding the output pipes), whatever the leader's
            // own status says.
            if guard_killed || (raw == KILLED_BY_SIGNAL && guard_fired) {
                let cause = cause.unwrap_or(StopCause::Canceled);
                info!(
                    %cause,
                    raw_exit_code = raw,
                    interrupted,
                    "command stopped preemptively"
                );
                errors.push(ExecError::Terminated(cause));
                STOPPED_PREEMPTIVELY_EXIT_CODE
            } else if success {
                if flag.is_terminal() || guard_fired {
                    warn!(
                        flag = ?flag,
                        cancel_fired,
                        timeout_fired,
                        "process exited cleanly although a stop was requested"
                    );
                }
                raw
            } else {
                info!(exit_code = raw, "command returned a nonzero exit status");
                raw
            }
        }

        WaitOutcome::Failed(e) => {
            warn!(error = %e, "waiting for process failed without exit status");
            errors.push(ExecError::Wait(e));
            ERROR_EXIT_CODE
        }
    };

    ExecutionResult::new(exit_code, errors)
}

/// Which guard to blame, preferring the one whose kill actually landed.
fn stop_cause(cancel: &GuardOutcome, timeout: &GuardOutcome) -> Option<StopCause> {
    if cancel.killed() {
        Some(StopCause::Canceled)
    } else if timeout.killed() {
        Some(StopCause::TimedOut)
    } else if cancel.fired() {
        Some(StopCause::Canceled)
    } else if timeout.fired() {
        Some(StopCause::TimedOut)
    } else {
        None
    }
}
