// src/exec/platform/unix.rs

use std::io;

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::debug;

use super::{KillOutcome, ProcessControl};

/// Runs each child as the leader of its own process group and kills the
/// whole group with `SIGKILL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixGroupControl;

impl ProcessControl for PosixGroupControl {
    fn prepare(&self, cmd: &mut Command) {
        // pgid == child pid
        cmd.process_group(0);
    }

    fn kill(&self, child: &mut Child, root_pid: Option<u32>) -> io::Result<KillOutcome> {
        // Reap the leader if it is done so it no longer counts as a group
        // member; the group itself may outlive it.
        let leader_exited = child.try_wait()?.is_some();
        let Some(pgid) = root_pid else {
            return Ok(KillOutcome::AlreadyExited);
        };

        match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            Ok(()) => {
                debug!(pgid, leader_exited, "sent SIGKILL to process group");
                Ok(KillOutcome::Killed { interrupted: false })
            }
            Err(Errno::ESRCH) => Ok(KillOutcome::AlreadyExited),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}
