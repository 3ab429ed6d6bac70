mod state;
mod view;
mod viewport;

use crate::display::DisplayState;
use crate::error::{RenderError, WatchError};
use crate::model::{StopReason, WatchConfig};
use crate::orchestrator::{PeriodicExecutor, ProcessRunner, StopSignal};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{Outcome, UiInput, UiState};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, Receiver};
use view::Theme;
use viewport::ScrollAction;

/// Upper bound on how long one pass of the render loop blocks on input.
/// The stop signal is checked once per pass.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Run a watch session: executor on the runtime, render loop on its own thread.
///
/// Returns once both sides have stopped. A command failure is returned only
/// after the terminal has been restored.
pub async fn run(cfg: WatchConfig) -> Result<(), WatchError> {
    let display = Arc::new(DisplayState::new(cfg.command_text(), cfg.interval));
    let stop = StopSignal::new();
    // Capacity 1: redraw requests coalesce, the state always holds the latest run.
    let (redraw_tx, redraw_rx) = mpsc::channel::<()>(1);

    // An interrupt from outside the terminal counts as a user quit.
    let interrupt_stop = stop.clone();
    let interrupt = tokio::spawn(async move {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    interrupt_stop.trigger(StopReason::UserQuit);
                }
            }
            _ = interrupt_stop.cancelled() => {}
        }
    });

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_display = display.clone();
    let ui_stop = stop.clone();
    let ui_handle = std::thread::spawn(move || {
        let _guard = StopOnDrop(ui_stop.clone());
        run_threaded(ui_display, ui_stop, redraw_rx)
    });

    let executor = PeriodicExecutor::new(ProcessRunner, &cfg, display, stop.clone(), redraw_tx);
    let exec_res = executor.run().await;
    interrupt.abort();

    // The executor only returns after the stop signal fired, which the UI
    // thread observes within one pass. Wait for it to restore the terminal
    // before reporting anything.
    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    match join_res {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => return Err(e.into()),
        Ok(Err(_)) | Err(_) => return Err(RenderError::Panicked.into()),
    }

    tracing::info!(reason = stop.reason().map(StopReason::as_str), "watch session ended");
    exec_res.map_err(WatchError::from)
}

/// Fires the stop signal when the UI thread exits, however it exits.
struct StopOnDrop(StopSignal);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.trigger(StopReason::RenderFailed);
    }
}

/// Own the terminal until quit or cancellation, then restore it.
fn run_threaded(
    display: Arc<DisplayState>,
    stop: StopSignal,
    redraw_rx: Receiver<()>,
) -> Result<(), RenderError> {
    if let Err(e) = enable_raw_mode() {
        stop.trigger(StopReason::RenderFailed);
        return Err(RenderError::Setup(e));
    }
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        stop.trigger(StopReason::RenderFailed);
        return Err(RenderError::Setup(e));
    }

    let res = Terminal::new(CrosstermBackend::new(stdout))
        .map_err(RenderError::Setup)
        .and_then(|mut terminal| event_loop(&mut terminal, &display, &stop, redraw_rx));

    restore_terminal();
    match &res {
        Ok(()) => tracing::info!("terminal restored"),
        Err(e) => {
            tracing::error!(error = %e, "terminal session failed");
            stop.trigger(StopReason::RenderFailed);
        }
    }
    res
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableMouseCapture, LeaveAlternateScreen).ok();
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    display: &DisplayState,
    stop: &StopSignal,
    mut redraw_rx: Receiver<()>,
) -> Result<(), RenderError> {
    let theme = Theme::default();
    let mut state = UiState::new(display.snapshot());
    terminal.clear().map_err(RenderError::Setup)?;
    terminal
        .draw(|f| view::draw(f, &state, &theme))
        .map_err(RenderError::Draw)?;

    // crossterm reports no initial size, so seed the first size event ourselves.
    let size = terminal.size().map_err(RenderError::Setup)?;
    let mut dirty = state.apply(
        UiInput::Resize {
            width: size.width,
            height: size.height,
        },
        || display.snapshot(),
    ) == Outcome::Redraw;

    loop {
        if let Some(reason) = stop.reason() {
            state.apply(UiInput::Cancelled(reason), || display.snapshot());
        }

        // Drain pending notifications; one refresh covers all of them.
        let mut refresh = false;
        loop {
            match redraw_rx.try_recv() {
                Ok(()) => refresh = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if refresh && state.apply(UiInput::Refresh, || display.snapshot()) == Outcome::Redraw {
            dirty = true;
        }

        if state.is_terminated() {
            tracing::info!(reason = ?stop.reason(), "render loop terminating");
            return Ok(());
        }

        if dirty {
            terminal
                .draw(|f| view::draw(f, &state, &theme))
                .map_err(RenderError::Draw)?;
            dirty = false;
        }

        if event::poll(INPUT_POLL).map_err(RenderError::Input)? {
            let ev = event::read().map_err(RenderError::Input)?;
            let Some(input) = map_event(&ev) else {
                continue;
            };
            match state.apply(input, || display.snapshot()) {
                Outcome::Redraw => dirty = true,
                Outcome::Exit(reason) => {
                    stop.trigger(reason);
                }
                Outcome::Ignored => {}
            }
        }
    }
}

/// Translate a terminal event into a state machine input.
fn map_event(ev: &Event) -> Option<UiInput> {
    match ev {
        Event::Key(k) => map_key(k),
        Event::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(UiInput::Scroll(ScrollAction::wheel_up())),
            MouseEventKind::ScrollDown => Some(UiInput::Scroll(ScrollAction::wheel_down())),
            _ => None,
        },
        Event::Resize(width, height) => Some(UiInput::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn map_key(k: &KeyEvent) -> Option<UiInput> {
    if k.kind != KeyEventKind::Press {
        return None;
    }
    let scroll = |action| Some(UiInput::Scroll(action));
    match (k.modifiers, k.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(UiInput::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => scroll(ScrollAction::HalfPageUp),
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => scroll(ScrollAction::HalfPageDown),
        (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => Some(UiInput::Quit),
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => scroll(ScrollAction::LineUp(1)),
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => scroll(ScrollAction::LineDown(1)),
        (_, KeyCode::PageUp) | (_, KeyCode::Char('b')) => scroll(ScrollAction::PageUp),
        (_, KeyCode::PageDown) | (_, KeyCode::Char('f')) | (_, KeyCode::Char(' ')) => {
            scroll(ScrollAction::PageDown)
        }
        (_, KeyCode::Char('u')) => scroll(ScrollAction::HalfPageUp),
        (_, KeyCode::Char('d')) => scroll(ScrollAction::HalfPageDown),
        (_, KeyCode::Home) | (_, KeyCode::Char('g')) => scroll(ScrollAction::Top),
        (_, KeyCode::End) | (_, KeyCode::Char('G')) => scroll(ScrollAction::Bottom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn quit_keys() {
        for ev in [
            key(KeyCode::Char('q'), KeyModifiers::NONE),
            key(KeyCode::Esc, KeyModifiers::NONE),
            key(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(map_event(&ev), Some(UiInput::Quit));
        }
        // Plain 'c' is not bound.
        assert_eq!(map_event(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn navigation_keys() {
        let cases = [
            (key(KeyCode::Down, KeyModifiers::NONE), ScrollAction::LineDown(1)),
            (key(KeyCode::Char('k'), KeyModifiers::NONE), ScrollAction::LineUp(1)),
            (key(KeyCode::Char(' '), KeyModifiers::NONE), ScrollAction::PageDown),
            (key(KeyCode::Char('b'), KeyModifiers::NONE), ScrollAction::PageUp),
            (key(KeyCode::Char('d'), KeyModifiers::CONTROL), ScrollAction::HalfPageDown),
            (key(KeyCode::Char('u'), KeyModifiers::NONE), ScrollAction::HalfPageUp),
            (key(KeyCode::Char('G'), KeyModifiers::SHIFT), ScrollAction::Bottom),
            (key(KeyCode::Home, KeyModifiers::NONE), ScrollAction::Top),
        ];
        for (ev, action) in cases {
            assert_eq!(map_event(&ev), Some(UiInput::Scroll(action)), "{ev:?}");
        }
    }

    #[test]
    fn key_release_is_ignored() {
        let ev = Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(&ev), None);
    }

    #[test]
    fn mouse_wheel_scrolls_three_lines() {
        let wheel = |kind| {
            Event::Mouse(MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            })
        };
        assert_eq!(
            map_event(&wheel(MouseEventKind::ScrollDown)),
            Some(UiInput::Scroll(ScrollAction::LineDown(3)))
        );
        assert_eq!(
            map_event(&wheel(MouseEventKind::ScrollUp)),
            Some(UiInput::Scroll(ScrollAction::LineUp(3)))
        );
    }

    #[test]
    fn resize_event_carries_dimensions() {
        assert_eq!(
            map_event(&Event::Resize(120, 40)),
            Some(UiInput::Resize {
                width: 120,
                height: 40
            })
        );
    }

    #[test]
    fn stop_on_drop_fires_without_overriding() {
        let stop = StopSignal::new();
        stop.trigger(StopReason::ExecutionFailed);
        drop(StopOnDrop(stop.clone()));
        assert_eq!(stop.reason(), Some(StopReason::ExecutionFailed));

        let fresh = StopSignal::new();
        drop(StopOnDrop(fresh.clone()));
        assert_eq!(fresh.reason(), Some(StopReason::RenderFailed));
    }
}
