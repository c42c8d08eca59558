//! Session - one pane's terminal content and its attached process
//!
//! The screen model is a `vt100::Parser`. Output from the process and local
//! notices written by the multiplexer both go through it. The viewport scroll
//! offset is the parser's scrollback position.

use super::pty::{Process, ProcessId};

/// Lines of history kept per pane
pub const SCROLLBACK_LINES: usize = 1000;

/// A pane's terminal session
pub struct Session {
    parser: vt100::Parser,
    process: Option<Box<dyn Process>>,
    bell: BellScanner,
}

impl Session {
    /// Create a session with an empty screen of the given inner size
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            parser: vt100::Parser::new(rows.max(1), cols.max(1), SCROLLBACK_LINES),
            process: None,
            bell: BellScanner::default(),
        }
    }

    pub fn screen(&self) -> &vt100::Screen {
        self.parser.screen()
    }

    /// Current (cols, rows)
    pub fn size(&self) -> (u16, u16) {
        let (rows, cols) = self.parser.screen().size();
        (cols, rows)
    }

    /// Feed process output into the screen. Returns true if it rang the bell.
    pub fn feed(&mut self, data: &[u8]) -> bool {
        let rang = self.bell.scan(data);
        self.parser.process(data);
        rang
    }

    /// Write a local message into the pane, as if the process printed it
    pub fn write_notice(&mut self, text: &str) {
        self.parser.process(text.as_bytes());
    }

    /// Resize the screen and the attached pty
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let (cols, rows) = (cols.max(1), rows.max(1));
        if self.size() == (cols, rows) {
            return;
        }
        self.parser.screen_mut().set_size(rows, cols);
        if let Some(process) = self.process.as_mut() {
            if let Err(e) = process.resize(cols, rows) {
                tracing::warn!("resize of process {} failed: {}", process.id(), e);
            }
        }
    }

    pub fn attach(&mut self, process: Box<dyn Process>) {
        self.process = Some(process);
    }

    pub fn detach(&mut self) -> Option<Box<dyn Process>> {
        self.process.take()
    }

    pub fn process_id(&self) -> Option<ProcessId> {
        self.process.as_ref().map(|p| p.id())
    }

    pub fn has_process(&self) -> bool {
        self.process.is_some()
    }

    /// Send input to the process. Returns false if nothing is attached.
    pub fn send(&mut self, data: &[u8]) -> bool {
        match self.process.as_mut() {
            Some(process) => {
                if let Err(e) = process.write(data) {
                    tracing::warn!("write to process {} failed: {}", process.id(), e);
                }
                true
            }
            None => false,
        }
    }

    pub fn interrupt(&mut self) {
        if let Some(process) = self.process.as_mut() {
            if let Err(e) = process.interrupt() {
                tracing::warn!("interrupt of process {} failed: {}", process.id(), e);
            }
        }
    }

    /// Hard-terminate and detach the process. Its exit event becomes stale.
    pub fn kill(&mut self) -> Option<ProcessId> {
        let mut process = self.process.take()?;
        if let Err(e) = process.terminate() {
            tracing::warn!("terminate of process {} failed: {}", process.id(), e);
        }
        Some(process.id())
    }

    /// Lines scrolled back from the live end
    pub fn scroll_offset(&self) -> usize {
        self.parser.screen().scrollback()
    }

    /// Move the viewport; positive goes back into history.
    /// Returns the resulting offset.
    pub fn scroll_by(&mut self, lines: isize) -> usize {
        let target = if lines >= 0 {
            self.scroll_offset().saturating_add(lines as usize)
        } else {
            self.scroll_offset().saturating_sub(lines.unsigned_abs())
        };
        self.parser.screen_mut().set_scrollback(target);
        self.scroll_offset()
    }

    pub fn reset_scroll(&mut self) {
        self.parser.screen_mut().set_scrollback(0);
    }
}

/// Finds BEL characters that are not terminating an OSC or other string
#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum BellState {
    #[default]
    Ground,
    Escape,
    Str,
    StrEscape,
}

#[derive(Debug, Default)]
struct BellScanner {
    state: BellState,
}

impl BellScanner {
    fn scan(&mut self, data: &[u8]) -> bool {
        let mut rang = false;
        for &b in data {
            self.state = match (self.state, b) {
                (BellState::Ground, 0x07) => {
                    rang = true;
                    BellState::Ground
                }
                (BellState::Ground, 0x1b) => BellState::Escape,
                (BellState::Ground, _) => BellState::Ground,
                // OSC, DCS, APC, PM
                (BellState::Escape, b']' | b'P' | b'_' | b'^') => BellState::Str,
                (BellState::Escape, 0x1b) => BellState::Escape,
                (BellState::Escape, _) => BellState::Ground,
                (BellState::Str, 0x07) => BellState::Ground,
                (BellState::Str, 0x1b) => BellState::StrEscape,
                (BellState::Str, _) => BellState::Str,
                (BellState::StrEscape, b'\\') => BellState::Ground,
                (BellState::StrEscape, 0x1b) => BellState::StrEscape,
                (BellState::StrEscape, _) => BellState::Str,
            };
        }
        rang
    }
}
