//! Periodic command executor.
//!
//! Reruns the watched command on a fixed interval and publishes each
//! successful result for the render loop.

use crate::display::DisplayState;
use crate::error::ExecutionError;
use crate::model::{now_local, StopReason, WatchConfig};
use crate::orchestrator::process::CommandRunner;
use crate::orchestrator::signal::StopSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

pub(crate) struct PeriodicExecutor<R> {
    runner: R,
    command: Vec<String>,
    interval: Duration,
    display: Arc<DisplayState>,
    stop: StopSignal,
    redraw_tx: mpsc::Sender<()>,
}

impl<R: CommandRunner> PeriodicExecutor<R> {
    pub(crate) fn new(
        runner: R,
        cfg: &WatchConfig,
        display: Arc<DisplayState>,
        stop: StopSignal,
        redraw_tx: mpsc::Sender<()>,
    ) -> Self {
        Self {
            runner,
            command: cfg.command.clone(),
            interval: cfg.interval,
            display,
            stop,
            redraw_tx,
        }
    }

    /// Tick until the stop signal fires or the command fails.
    ///
    /// A failure fires the stop signal with [`StopReason::ExecutionFailed`]
    /// before it is returned. Cancellation is not an error.
    pub(crate) async fn run(self) -> Result<(), ExecutionError> {
        // First run lands one interval after start, like a ticker.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        // A slow command pushes the schedule back instead of bunching ticks up.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            command = ?self.command,
            interval = %humantime::format_duration(self.interval),
            "executor started"
        );

        loop {
            tokio::select! {
                biased;
                reason = self.stop.cancelled() => {
                    tracing::info!(reason = reason.as_str(), "executor stopping");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            match self.runner.run(&self.command, &self.stop).await {
                Ok(output) => {
                    let completed_at = now_local();
                    let display = &self.display;
                    // Check and publish as one step: a stop that races the
                    // finishing command either wins outright or waits for it.
                    let Some(seq) = self
                        .stop
                        .unless_triggered(|| display.publish_run(output, completed_at))
                    else {
                        tracing::info!("executor stopping after in-flight run");
                        return Ok(());
                    };
                    tracing::debug!(seq, "run published");
                    // Capacity 1: a pending notification already covers this run.
                    let _ = self.redraw_tx.try_send(());
                }
                Err(ExecutionError::Cancelled) => {
                    tracing::info!("executor cancelled mid-run");
                    return Ok(());
                }
                Err(e) => {
                    if !self.stop.trigger(StopReason::ExecutionFailed) {
                        // Someone else shut the session down first; this
                        // failure is most likely a consequence of that.
                        tracing::debug!(error = %e, "ignoring failure after stop");
                        return Ok(());
                    }
                    tracing::error!(error = %e, "command failed, ending session");
                    return Err(e);
                }
            }
        }
    }
}
