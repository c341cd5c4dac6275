// src/exec/guards.rs

//! Watchers that force-kill a running child.
//!
//! - [`CancellationGuard`] waits on the caller's cancel flag.
//! - [`TimeoutGuard`] waits on the execution deadline.
//!
//! Both run as Tokio tasks scoped to one execution. They never touch the
//! output streams; their only effect is a kill request through a
//! [`ProcessHandle`]. What they did is reported back through their join
//! value, which the runner collects exactly once.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cancel::{CancelSignal, CancelState};
use crate::errors::StopCause;
use crate::exec::handle::ProcessHandle;
use crate::exec::platform::KillOutcome;

/// What a guard did during one execution.
#[derive(Debug)]
pub enum GuardOutcome {
    /// The trigger never fired.
    Idle,
    /// The trigger fired but the process had already exited.
    RaceLost,
    /// The kill was delivered to a live process.
    Killed { interrupted: bool },
    /// The trigger fired and the kill failed.
    KillFailed(io::Error),
}

impl GuardOutcome {
    fn from_kill(cause: StopCause, result: io::Result<KillOutcome>) -> Self {
        match result {
            Ok(KillOutcome::Killed { interrupted }) => {
                info!(%cause, interrupted, "process killed");
                GuardOutcome::Killed { interrupted }
            }
            Ok(KillOutcome::AlreadyExited) => {
                debug!(%cause, "process already exited; nothing to kill");
                GuardOutcome::RaceLost
            }
            Err(e) => {
                warn!(%cause, error = %e, "failed to kill process");
                GuardOutcome::KillFailed(e)
            }
        }
    }

    /// The guard's trigger condition was met, whether or not it killed.
    pub fn fired(&self) -> bool {
        !matches!(self, GuardOutcome::Idle)
    }

    pub fn interrupted(&self) -> bool {
        matches!(self, GuardOutcome::Killed { interrupted: true })
    }

    pub fn killed(&self) -> bool {
        matches!(self, GuardOutcome::Killed { .. })
    }
}

/// Kills the process when the cancel flag becomes `Canceled`.
///
/// `ShutDown` is not a trigger: running work is left to finish.
pub struct CancellationGuard {
    exited_tx: oneshot::Sender<()>,
    task: JoinHandle<GuardOutcome>,
}

impl CancellationGuard {
    pub fn spawn(cancel: Arc<dyn CancelSignal>, process: ProcessHandle) -> Self {
        let (exited_tx, mut exited_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            tokio::select! {
                // Process exit takes priority: never kill once it is gone.
                biased;

                _ = &mut exited_rx => GuardOutcome::Idle,

                state = cancel.wait() => match state {
                    CancelState::Canceled => {
                        info!(pid = ?process.pid(), "cancel requested; killing process");
                        let result = process.kill(StopCause::Canceled).await;
                        GuardOutcome::from_kill(StopCause::Canceled, result)
                    }
                    CancelState::ShutDown => {
                        info!(pid = ?process.pid(), "shutdown requested; letting process finish");
                        GuardOutcome::Idle
                    }
                    CancelState::Running => GuardOutcome::Idle,
                },
            }
        });

        Self { exited_tx, task }
    }

    /// Tell the guard the process has exited and collect its outcome.
    pub async fn stop(self) -> GuardOutcome {
        let _ = self.exited_tx.send(());
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "cancellation guard task failed");
                GuardOutcome::Idle
            }
        }
    }
}

const ARMED: u8 = 0;
const FIRED: u8 = 1;
const STOPPED: u8 = 2;

/// Kills the process once `after` has elapsed.
///
/// Firing and stopping race on a single atomic, so exactly one of them wins:
/// [`TimeoutGuard::stop`] returning `false` means the timer fired.
pub struct TimeoutGuard {
    state: Arc<AtomicU8>,
    task: JoinHandle<GuardOutcome>,
}

impl TimeoutGuard {
    pub fn arm(after: Duration, process: ProcessHandle) -> Self {
        let state = Arc::new(AtomicU8::new(ARMED));
        let timer_state = Arc::clone(&state);

        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;

            if timer_state
                .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return GuardOutcome::Idle;
            }

            info!(
                pid = ?process.pid(),
                timeout_secs = after.as_secs(),
                "execution timeout reached; killing process"
            );
            let result = process.kill(StopCause::TimedOut).await;
            GuardOutcome::from_kill(StopCause::TimedOut, result)
        });

        Self { state, task }
    }

    /// Disarm the timer.
    ///
    /// Returns `true` if the timer was stopped before firing and `false` if
    /// it had already fired.
    pub fn stop(&self) -> bool {
        let stopped = self
            .state
            .compare_exchange(ARMED, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if stopped {
            self.task.abort();
        }
        stopped
    }

    /// Wait for the timer task to finish. Call after [`TimeoutGuard::stop`].
    pub async fn join(self) -> GuardOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => GuardOutcome::Idle,
            Err(e) => {
                warn!(error = %e, "timeout guard task failed");
                GuardOutcome::Idle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelFlag;

    /// Pretend owner that answers every kill request with `reply`.
    fn fake_owner(reply: KillOutcome) -> (ProcessHandle, JoinHandle<usize>) {
        let (handle, mut rx) = ProcessHandle::channel(Some(1234));
        let owner = tokio::spawn(async move {
            let mut kills = 0;
            while let Some(request) = rx.recv().await {
                kills += 1;
                let _ = request.reply.send(Ok(reply));
            }
            kills
        });
        (handle, owner)
    }

    #[tokio::test]
    async fn timer_stopped_before_deadline_reports_true_and_idle() {
        let (handle, owner) = fake_owner(KillOutcome::Killed { interrupted: false });
        let guard = TimeoutGuard::arm(Duration::from_secs(60), handle);

        assert!(guard.stop());
        assert!(matches!(guard.join().await, GuardOutcome::Idle));
        assert_eq!(owner.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn timer_that_fired_reports_false_from_stop() {
        let (handle, owner) = fake_owner(KillOutcome::Killed { interrupted: false });
        let guard = TimeoutGuard::arm(Duration::from_millis(10), handle);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!guard.stop());
        let outcome = guard.join().await;
        assert!(outcome.killed());
        assert_eq!(owner.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancel_guard_kills_on_cancel() {
        let (handle, owner) = fake_owner(KillOutcome::Killed { interrupted: false });
        let flag = Arc::new(CancelFlag::new());
        let guard = CancellationGuard::spawn(flag.clone(), handle);

        flag.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let outcome = guard.stop().await;
        assert!(outcome.killed());
        assert_eq!(owner.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancel_guard_ignores_shutdown() {
        let (handle, owner) = fake_owner(KillOutcome::Killed { interrupted: false });
        let flag = Arc::new(CancelFlag::new());
        let guard = CancellationGuard::spawn(flag.clone(), handle);

        flag.shutdown();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(matches!(guard.stop().await, GuardOutcome::Idle));
        assert_eq!(owner.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cancel_guard_does_nothing_after_process_exit() {
        let (handle, owner) = fake_owner(KillOutcome::Killed { interrupted: false });
        let flag = Arc::new(CancelFlag::new());
        let guard = CancellationGuard::spawn(flag.clone(), handle);

        let outcome = guard.stop().await;
        flag.cancel();

        assert!(matches!(outcome, GuardOutcome::Idle));
        assert_eq!(owner.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cancel_after_exit_reported_by_owner_is_race_lost() {
        let (handle, owner) = fake_owner(KillOutcome::AlreadyExited);
        let flag = Arc::new(CancelFlag::new());
        flag.cancel();
        let guard = CancellationGuard::spawn(flag.clone(), handle);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let outcome = guard.stop().await;
        assert!(matches!(outcome, GuardOutcome::RaceLost));
        assert!(outcome.fired());
        assert!(!outcome.killed());
        assert_eq!(owner.await.unwrap(), 1);
    }
}
