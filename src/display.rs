//! Shared display state.
//!
//! The executor publishes runs, the render loop takes snapshots. Both go
//! through one lock covering the whole structure so `output` and
//! `completed_at` are always observed together.

use crate::model::{RunResult, Snapshot};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use time::OffsetDateTime;

struct Inner {
    command_text: String,
    interval: Duration,
    latest: Option<RunResult>,
    runs: u64,
}

pub struct DisplayState {
    inner: RwLock<Inner>,
}

impl DisplayState {
    pub fn new(command_text: impl Into<String>, interval: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                command_text: command_text.into(),
                interval,
                latest: None,
                runs: 0,
            }),
        }
    }

    /// Replace the latest run. Returns the sequence number assigned to it.
    pub fn publish_run(&self, output: String, completed_at: OffsetDateTime) -> u64 {
        // Nothing inside the lock can panic halfway through an update, so a
        // poisoned lock still holds consistent data.
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.runs += 1;
        let seq = inner.runs;
        inner.latest = Some(RunResult {
            output,
            completed_at,
            seq,
        });
        seq
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Snapshot {
            command_text: inner.command_text.clone(),
            interval: inner.interval,
            latest: inner.latest.clone(),
        }
    }
}
