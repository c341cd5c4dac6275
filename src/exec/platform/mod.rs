// src/exec/platform/mod.rs

//! OS-specific process control.
//!
//! Killing only the direct child is not enough: a shell script that started
//! `sleep` leaves the grandchild holding the output pipes, and the runner
//! would keep waiting for EOF. Each platform therefore decides how a child is
//! prepared at spawn time and how its whole tree is torn down.

use std::fmt::Debug;
use std::io;
use std::sync::Arc;

use tokio::process::{Child, Command};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::PosixGroupControl;
#[cfg(windows)]
pub use windows::WindowsHandleControl;

/// Result of a kill request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    /// The process was alive and has been sent a kill.
    ///
    /// `interrupted` is set by platforms whose kill method leaves no
    /// recognisable signal status behind; the classifier then trusts this
    /// marker instead of the raw exit code.
    Killed { interrupted: bool },
    /// Nothing to kill: the process had already exited.
    AlreadyExited,
}

/// Platform strategy for spawning and tearing down a process tree.
pub trait ProcessControl: Send + Sync + Debug {
    /// Adjust the command before it is spawned.
    fn prepare(&self, cmd: &mut Command);

    /// Kill the child and everything it started.
    ///
    /// `root_pid` is the child's pid captured at spawn; it stays valid for
    /// addressing the tree after the child itself has been reaped, which is
    /// when descendants may still hold the output pipes.
    ///
    /// Must be a successful no-op ([`KillOutcome::AlreadyExited`]) when
    /// nothing of the tree is left, however many times it is called.
    fn kill(&self, child: &mut Child, root_pid: Option<u32>) -> io::Result<KillOutcome>;
}

/// Process control for the platform this binary was built for.
pub fn native() -> Arc<dyn ProcessControl> {
    #[cfg(unix)]
    {
        Arc::new(PosixGroupControl)
    }

    #[cfg(windows)]
    {
        Arc::new(WindowsHandleControl)
    }
}
