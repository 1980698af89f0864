use std::io::{self, Stdout};
use std::panic;
use std::sync::Once;

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{CompletedFrame, Frame, Terminal};
use tracing::{debug, warn};

static PANIC_HOOK: Once = Once::new();

/// The interactive board's hold on stdout.
///
/// While alive the terminal is in raw mode on the alternate screen with the
/// cursor hidden. Dropping it, or panicking, puts the shell back.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub fn start() -> io::Result<Self> {
        PANIC_HOOK.call_once(chain_restore_into_panic_hook);

        enable_raw_mode()?;
        let terminal = execute!(io::stdout(), EnterAlternateScreen, Hide)
            .and_then(|()| Terminal::new(CrosstermBackend::new(io::stdout())))
            .inspect_err(|_| restore())?;

        debug!("raw mode on, alternate screen entered");
        Ok(Self { terminal })
    }

    /// Draws one frame.
    pub fn draw<F>(&mut self, render: F) -> io::Result<CompletedFrame<'_>>
    where
        F: FnOnce(&mut Frame<'_>),
    {
        self.terminal.draw(render)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        restore();
        debug!("terminal handed back");
    }
}

fn chain_restore_into_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

/// Leaves raw mode and the alternate screen. Safe to call more than once.
fn restore() {
    if let Err(error) = disable_raw_mode() {
        warn!(%error, "could not leave raw mode");
    }
    if let Err(error) = execute!(io::stdout(), Show, LeaveAlternateScreen) {
        warn!(%error, "could not leave the alternate screen");
    }
}
