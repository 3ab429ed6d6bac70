//! One-shot stop signal shared by the executor and the render loop.

use crate::model::StopReason;
use std::sync::Arc;
use tokio::sync::watch;

/// Broadcast stop flag carrying the reason for shutdown.
///
/// The first `trigger` wins; later calls are ignored so the reason seen by
/// every observer is stable. Cheap to clone.
#[derive(Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<Option<StopReason>>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns `true` if this call was the one that fired it.
    pub fn trigger(&self, reason: StopReason) -> bool {
        let fired = self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
        if fired {
            tracing::info!(reason = reason.as_str(), "stop signal triggered");
        }
        fired
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.tx.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.reason().is_some()
    }

    /// Run `f` only if the signal has not fired yet.
    ///
    /// `f` runs under the signal's write lock, so a concurrent `trigger`
    /// lands strictly before the check or strictly after `f` returns.
    /// `f` must not touch this signal.
    pub fn unless_triggered<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let mut out = None;
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                out = Some(f());
            }
            false
        });
        out
    }

    /// Resolves once the signal has fired (immediately if it already has).
    pub async fn cancelled(&self) -> StopReason {
        let mut rx = self.tx.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if let Some(reason) = current {
                return reason;
            }
            // The sender lives in `self`, so the channel can't close under us.
            if rx.changed().await.is_err() {
                return StopReason::UserQuit;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_trigger_wins() {
        let stop = StopSignal::new();
        assert!(!stop.is_triggered());
        assert!(stop.trigger(StopReason::ExecutionFailed));
        assert!(!stop.trigger(StopReason::UserQuit));
        assert_eq!(stop.reason(), Some(StopReason::ExecutionFailed));
    }

    #[test]
    fn clones_share_state() {
        let stop = StopSignal::new();
        let other = stop.clone();
        other.trigger(StopReason::UserQuit);
        assert_eq!(stop.reason(), Some(StopReason::UserQuit));
    }

    #[test]
    fn unless_triggered_skips_after_fire() {
        let stop = StopSignal::new();
        assert_eq!(stop.unless_triggered(|| 7), Some(7));
        stop.trigger(StopReason::UserQuit);
        assert_eq!(stop.unless_triggered(|| 7), None);
    }

    #[test]
    fn trigger_waits_for_a_running_guarded_section() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::{Arc, Barrier};

        let stop = StopSignal::new();
        let entered = Arc::new(Barrier::new(2));
        let finished = Arc::new(AtomicBool::new(false));

        let guarded = {
            let stop = stop.clone();
            let entered = entered.clone();
            let finished = finished.clone();
            std::thread::spawn(move || {
                stop.unless_triggered(|| {
                    entered.wait();
                    std::thread::sleep(Duration::from_millis(100));
                    finished.store(true, Ordering::SeqCst);
                })
            })
        };

        entered.wait();
        assert!(stop.trigger(StopReason::UserQuit));
        // The trigger could only land once the section was done.
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(guarded.join().unwrap(), Some(()));
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_fired() {
        let stop = StopSignal::new();
        stop.trigger(StopReason::RenderFailed);
        let reason = tokio::time::timeout(Duration::from_secs(1), stop.cancelled())
            .await
            .expect("should not wait");
        assert_eq!(reason, StopReason::RenderFailed);
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters_from_another_thread() {
        let stop = StopSignal::new();
        let waiter = {
            let stop = stop.clone();
            tokio::spawn(async move { stop.cancelled().await })
        };
        let trigger = stop.clone();
        std::thread::spawn(move || trigger.trigger(StopReason::UserQuit))
            .join()
            .unwrap();
        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert_eq!(reason, StopReason::UserQuit);
    }
}
