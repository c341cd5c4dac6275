// src/exec/handle.rs

//! Kill-only handle to a running child.
//!
//! The runner keeps exclusive ownership of the `tokio::process::Child`. Guards
//! get a [`ProcessHandle`], which can only *ask* the runner to kill. The
//! runner services those requests in the same loop that waits on the child,
//! so a kill is never delivered to a PID that has already been reaped.

use std::io;

use tokio::sync::{mpsc, oneshot};

use crate::errors::StopCause;
use crate::exec::platform::KillOutcome;

/// A guard's request to kill the process.
#[derive(Debug)]
pub(crate) struct KillRequest {
    pub cause: StopCause,
    pub reply: oneshot::Sender<io::Result<KillOutcome>>,
}

/// Cloneable, kill-only reference to the running child.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    tx: mpsc::Sender<KillRequest>,
}

impl ProcessHandle {
    /// Create a handle plus the receiving end the owner must service.
    ///
    /// Capacity covers one request per guard so `kill` never waits for room.
    pub(crate) fn channel(pid: Option<u32>) -> (Self, mpsc::Receiver<KillRequest>) {
        let (tx, rx) = mpsc::channel(2);
        (Self { pid, tx }, rx)
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the owner to kill the process tree.
    ///
    /// Once the owner has stopped listening (the process was reaped) this
    /// resolves to [`KillOutcome::AlreadyExited`].
    pub async fn kill(&self, cause: StopCause) -> io::Result<KillOutcome> {
        let (reply, reply_rx) = oneshot::channel();
        if self.tx.send(KillRequest { cause, reply }).await.is_err() {
            return Ok(KillOutcome::AlreadyExited);
        }
        reply_rx.await.unwrap_or(Ok(KillOutcome::AlreadyExited))
    }
}
