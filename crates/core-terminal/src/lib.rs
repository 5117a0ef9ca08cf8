//! Terminal session management: raw mode, alternate screen, and restoration.
//!
//! The pane core never talks to the terminal; only the host binary enters
//! and leaves the session through this crate. `SessionGuard` restores the
//! terminal even on early return or panic, so a crash never strands the
//! user's shell in raw mode.

use std::io::stdout;

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, size as term_size, EnterAlternateScreen,
        LeaveAlternateScreen, SetTitle,
    },
};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
}

/// Crossterm-backed terminal session. Idempotent enter/leave so the drop
/// path can run unconditionally.
pub struct CrosstermBackend {
    entered: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter the session and return a guard that leaves it on drop.
    pub fn enter_guard(&mut self) -> Result<SessionGuard<'_>> {
        self.enter()?;
        Ok(SessionGuard { backend: self })
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(stdout(), LeaveAlternateScreen, Show)?;
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// RAII guard tying terminal restoration to scope exit.
pub struct SessionGuard<'a> {
    backend: &'a mut CrosstermBackend,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let _ = self.backend.leave();
    }
}

/// Current terminal geometry as (columns, rows).
pub fn dimensions() -> Result<(u16, u16)> {
    Ok(term_size()?)
}
