use crate::model::{Snapshot, StopReason};
use crate::tui::viewport::{ScrollAction, Viewport};

/// Rows taken by the header line.
pub const HEADER_HEIGHT: u16 = 1;
/// Rows taken by the footer (rule plus bordered percentage box).
pub const FOOTER_HEIGHT: u16 = 3;

/// Rows left for the output once header and footer are placed.
pub fn body_height(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No terminal size known yet.
    Uninitialized,
    Ready,
    Terminated,
}

/// Inputs to the render loop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiInput {
    Resize { width: u16, height: u16 },
    Scroll(ScrollAction),
    /// New output may be available in the shared display state.
    Refresh,
    Quit,
    /// The stop signal fired somewhere else.
    Cancelled(StopReason),
}

/// What the loop should do after applying an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    Redraw,
    Exit(StopReason),
}

/// UI-local state owned by the render thread.
///
/// Only the snapshot copy comes from the shared state; geometry, scroll
/// offset and phase never leave this thread.
pub struct UiState {
    phase: Phase,
    viewport: Viewport,
    snapshot: Snapshot,
    width: u16,
    height: u16,
}

impl UiState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            phase: Phase::Uninitialized,
            viewport: Viewport::default(),
            snapshot,
            width: 0,
            height: 0,
        }
    }

    /// Apply one input. `latest` is only called when fresh shared state is needed.
    pub fn apply(&mut self, input: UiInput, latest: impl FnOnce() -> Snapshot) -> Outcome {
        if self.phase == Phase::Terminated {
            return Outcome::Ignored;
        }

        match input {
            UiInput::Quit => {
                self.phase = Phase::Terminated;
                Outcome::Exit(StopReason::UserQuit)
            }
            UiInput::Cancelled(reason) => {
                self.phase = Phase::Terminated;
                Outcome::Exit(reason)
            }
            UiInput::Resize { width, height } => self.resize(width, height, latest),
            UiInput::Refresh => {
                self.snapshot = latest();
                if self.phase == Phase::Ready {
                    self.viewport.set_content(output_of(&self.snapshot));
                }
                Outcome::Redraw
            }
            UiInput::Scroll(action) => {
                if self.phase != Phase::Ready {
                    return Outcome::Ignored;
                }
                let before = self.viewport.offset();
                self.viewport.scroll(action);
                if self.viewport.offset() == before {
                    Outcome::Ignored
                } else {
                    Outcome::Redraw
                }
            }
        }
    }

    fn resize(&mut self, width: u16, height: u16, latest: impl FnOnce() -> Snapshot) -> Outcome {
        let body = body_height(height);
        match self.phase {
            Phase::Uninitialized => {
                self.snapshot = latest();
                self.viewport = Viewport::new(width, body);
                self.viewport.set_content(output_of(&self.snapshot));
                self.phase = Phase::Ready;
                tracing::debug!(width, height, body, "terminal ready");
            }
            _ => {
                if (width, height) == (self.width, self.height) {
                    return Outcome::Ignored;
                }
                self.viewport.resize(width, body);
                tracing::debug!(width, height, body, "terminal resized");
            }
        }
        self.width = width;
        self.height = height;
        Outcome::Redraw
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

fn output_of(snapshot: &Snapshot) -> &str {
    snapshot
        .latest
        .as_ref()
        .map(|r| r.output.as_str())
        .unwrap_or("")
}
