//! Interactive terminal dashboard.
//!
//! Feature-gated behind `tui`. Launch with `--tui` on the CLI.

mod controls;
mod layout;
/// Application state and the cascading selection logic.
pub mod runtime;
mod style;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::config::DashboardConfig;
use crate::dashboard::InputPaths;
use crate::data::cache::DataStore;
use crate::error::DashboardError;
use runtime::App;

/// How long to wait for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Loads the inputs and runs the TUI event loop.
///
/// Inputs are loaded before the terminal is touched, so load errors are
/// returned to the caller with the screen intact. Sets up the terminal (raw
/// mode, alternate screen), runs the event loop, and restores the terminal on
/// exit, including when the loop fails.
///
/// # Errors
///
/// Returns the loader error if the initial load fails and
/// [`DashboardError::Terminal`] if the terminal cannot be set up, drawn to,
/// or restored.
pub fn run(
    store: DataStore,
    paths: InputPaths,
    config: &DashboardConfig,
) -> Result<(), DashboardError> {
    let mut app = App::new(store, paths, config)?;
    let mut terminal = setup_terminal().map_err(DashboardError::Terminal)?;
    let result = event_loop(&mut terminal, &mut app);
    let restored = restore_terminal(&mut terminal);
    finish(result, restored)
}

/// Enters raw mode and the alternate screen, undoing both on failure.
fn setup_terminal() -> io::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e);
    }
    Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })
}

/// Runs every restore step even if an earlier one fails.
fn restore_terminal(terminal: &mut Term) -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let cursor = terminal.show_cursor();
    raw.and(screen).and(cursor)
}

/// An event-loop error is reported in preference to a restore error.
fn finish(result: io::Result<()>, restored: io::Result<()>) -> Result<(), DashboardError> {
    result.and(restored).map_err(DashboardError::Terminal)
}

/// Core event loop: draw, then wait for input.
fn event_loop(terminal: &mut Term, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| layout::render(frame, app))?;

        if app.quit {
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                controls::handle_key(app, key);
            }
        }
    }
}
