// src/exec/mod.rs

//! Command execution core.
//!
//! - [`command`] holds the inputs (`CommandSpec`, `OutputSinks`) and the
//!   output (`ExecutionResult`) of one execution.
//! - [`runner`] owns the child process: spawn, output pumps, wait.
//! - [`guards`] contains the cancellation and timeout watchers.
//! - [`handle`] is the kill-only handle the guards use to reach the child.
//! - [`classify`] turns the wait result and guard outcomes into an exit code.
//! - [`platform`] provides the per-OS spawn preparation and tree kill.

pub mod classify;
pub mod command;
pub mod guards;
pub mod handle;
pub mod platform;
pub mod runner;

pub use classify::{ExitInput, WaitOutcome, classify};
pub use command::{
    CommandSpec, ERROR_EXIT_CODE, ExecutionResult, OutputSink, OutputSinks,
    STOPPED_PREEMPTIVELY_EXIT_CODE, SUCCESS_EXIT_CODE,
};
pub use guards::{CancellationGuard, GuardOutcome, TimeoutGuard};
pub use handle::ProcessHandle;
pub use platform::{KillOutcome, ProcessControl};
pub use runner::ProcessRunner;
