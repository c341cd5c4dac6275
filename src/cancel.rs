// src/cancel.rs

//! Cooperative cancel / shutdown signal shared between a caller and the
//! execution guards.
//!
//! The executor only *observes* the signal through [`CancelSignal`]. Setting
//! it is the caller's business (Ctrl-C handler, orchestrator message, ...).
//! [`CancelFlag`] is the implementation used by the binary and the tests.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::watch;
use tracing::debug;

/// Tri-state of a cancel flag.
///
/// `Canceled` and `ShutDown` are terminal: once reached, the flag never goes
/// back to `Running`, and the first terminal state wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelState {
    Running,
    Canceled,
    ShutDown,
}

impl CancelState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CancelState::Running)
    }
}

/// Read-only view of a cancel flag, as consumed by the executor.
pub trait CancelSignal: Send + Sync {
    /// Current state, without blocking.
    fn state(&self) -> CancelState;

    /// Resolve once the flag reaches a terminal state, returning that state.
    fn wait(&self) -> Pin<Box<dyn Future<Output = CancelState> + Send + '_>>;

    fn is_canceled(&self) -> bool {
        self.state() == CancelState::Canceled
    }

    fn is_shut_down(&self) -> bool {
        self.state() == CancelState::ShutDown
    }
}

/// `watch`-backed cancel flag.
#[derive(Debug)]
pub struct CancelFlag {
    tx: watch::Sender<CancelState>,
}

impl CancelFlag {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CancelState::Running);
        Self { tx }
    }

    /// Request cancellation. Returns `false` if the flag was already terminal.
    pub fn cancel(&self) -> bool {
        self.set(CancelState::Canceled)
    }

    /// Request shutdown. Returns `false` if the flag was already terminal.
    pub fn shutdown(&self) -> bool {
        self.set(CancelState::ShutDown)
    }

    fn set(&self, next: CancelState) -> bool {
        let applied = self.tx.send_if_modified(|current| {
            if current.is_terminal() {
                false
            } else {
                *current = next;
                true
            }
        });
        debug!(state = ?next, applied, "cancel flag set");
        applied
    }
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal for CancelFlag {
    fn state(&self) -> CancelState {
        *self.tx.borrow()
    }

    fn wait(&self) -> Pin<Box<dyn Future<Output = CancelState> + Send + '_>> {
        let mut rx = self.tx.subscribe();
        Box::pin(async move {
            let reached = rx.wait_for(|state| state.is_terminal()).await.map(|s| *s);
            // The sender lives in `self`, so it cannot be dropped while this
            // future borrows it.
            reached.unwrap_or_else(|_| *rx.borrow())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn first_terminal_state_wins() {
        let flag = CancelFlag::new();
        assert_eq!(flag.state(), CancelState::Running);

        assert!(flag.shutdown());
        assert!(!flag.cancel());
        assert_eq!(flag.state(), CancelState::ShutDown);
        assert!(flag.is_shut_down());
        assert!(!flag.is_canceled());
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_already_terminal() {
        let flag = CancelFlag::new();
        flag.cancel();
        let state = tokio::time::timeout(Duration::from_millis(100), flag.wait())
            .await
            .expect("wait should not block on a terminal flag");
        assert_eq!(state, CancelState::Canceled);
    }

    #[tokio::test]
    async fn wait_wakes_on_cancel() {
        let flag = Arc::new(CancelFlag::new());
        let waiter = {
            let flag = Arc::clone(&flag);
            tokio::spawn(async move { flag.wait().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        flag.cancel();
        let state = waiter.await.unwrap();
        assert_eq!(state, CancelState::Canceled);
    }
}
