//! Terminal setup, teardown and the event source for the main loop.

use anyhow::Result;
use crossterm::{
    event::{self, KeyEvent, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};

/// Smallest terminal the dashboards lay out cleanly in.
const MIN_WIDTH: u16 = 100;
const MIN_HEIGHT: u16 = 32;

#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    /// No input arrived within one tick; time-driven work (toast expiry,
    /// payment polling) runs here.
    Tick,
}

pub type Frame<'a> = ratatui::Frame<'a>;

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    tick_rate: Duration,
}

impl Tui {
    pub fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Self {
        Self {
            terminal,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        self.set_min_size(MIN_WIDTH, MIN_HEIGHT)?;
        Ok(())
    }

    pub fn set_min_size(&self, width: u16, height: u16) -> Result<()> {
        let (current_width, current_height) = terminal::size()?;
        if current_width < width || current_height < height {
            io::stdout().execute(terminal::SetSize(
                current_width.max(width),
                current_height.max(height),
            ))?;
        }
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stdout(), LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Waits up to one tick for a key press. Releases, repeats and
    /// non-key events count as a tick.
    pub fn next_event(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            if let event::Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Event::Key(key));
                }
            }
        }
        Ok(Event::Tick)
    }
}

/// Restores the terminal even if the app panics or returns early.
pub struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
    }
}
