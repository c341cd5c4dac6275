// src/exec/platform/windows.rs

use std::io;

use tokio::process::{Child, Command};
use tracing::debug;

use super::{KillOutcome, ProcessControl};

/// Terminates the child through its process handle.
///
/// Windows has no process-group kill here, and `TerminateProcess` leaves an
/// ordinary exit code behind, so every successful kill is reported as
/// interrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsHandleControl;

impl ProcessControl for WindowsHandleControl {
    fn prepare(&self, _cmd: &mut Command) {}

    /// Only the direct child is reachable through its handle; once it has
    /// exited there is nothing left to address.
    fn kill(&self, child: &mut Child, _root_pid: Option<u32>) -> io::Result<KillOutcome> {
        if child.try_wait()?.is_some() {
            return Ok(KillOutcome::AlreadyExited);
        }

        match child.start_kill() {
            Ok(()) => {
                debug!(pid = ?child.id(), "terminated process handle");
                Ok(KillOutcome::Killed { interrupted: true })
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(KillOutcome::AlreadyExited),
            Err(e) => Err(e),
        }
    }
}
