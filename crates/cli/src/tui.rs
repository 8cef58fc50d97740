use std::io::Stdout;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use deskpet_core::runtime::{FrameView, Frontend, FrontendError};
use deskpet_core::ui::UiInput;

use crate::widgets::{self, STATUS_ROWS};

/// Full-screen terminal frontend: raw mode, alternate screen, mouse capture.
pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    stop: Arc<AtomicBool>,
    input_thread: Option<std::thread::JoinHandle<()>>,
    restored: bool,
}

impl TerminalFrontend {
    pub fn enter() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            stop: Arc::new(AtomicBool::new(false)),
            input_thread: None,
            restored: false,
        })
    }

    /// Cells available to the pet (terminal minus the status line).
    pub fn stage_size(&self) -> std::io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height.saturating_sub(STATUS_ROWS)))
    }

    /// Start forwarding terminal events to the frame loop.
    pub fn forward_input(&mut self, tx: mpsc::Sender<UiInput>) {
        self.input_thread = Some(crate::event::spawn(tx, Arc::clone(&self.stop)));
    }

    /// Leave raw mode and the alternate screen. Safe to call twice.
    pub fn restore(&mut self) -> std::io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
        terminal::disable_raw_mode()?;
        crossterm::execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Frontend for TerminalFrontend {
    fn draw(&mut self, view: &FrameView<'_>) -> Result<(), FrontendError> {
        if self.restored {
            return Err(FrontendError::Closed);
        }
        self.terminal.draw(|f| widgets::draw(f, view))?;
        Ok(())
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!(error = %e, "terminal not restored cleanly");
        }
    }
}
