use std::time::Duration;
use time::OffsetDateTime;

/// Everything the watch session needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Program followed by its arguments. Never empty.
    pub command: Vec<String>,
    pub interval: Duration,
}

impl WatchConfig {
    /// Human-readable form of the command, used in the header.
    pub fn command_text(&self) -> String {
        self.command.join(" ")
    }
}

/// Output of one successful tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub output: String,
    pub completed_at: OffsetDateTime,
    /// 1-based count of successful runs so far.
    pub seq: u64,
}

/// Consistent copy of the shared display state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub command_text: String,
    pub interval: Duration,
    pub latest: Option<RunResult>,
}

/// Why a watch session is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Quit key, Ctrl-C or an interrupt signal.
    UserQuit,
    /// The watched command failed; the error is reported after teardown.
    ExecutionFailed,
    /// The terminal session could not be started or kept running.
    RenderFailed,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::UserQuit => "user quit",
            StopReason::ExecutionFailed => "command failed",
            StopReason::RenderFailed => "terminal failure",
        }
    }
}

/// Current local time, falling back to UTC when the offset can't be determined.
pub fn now_local() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
