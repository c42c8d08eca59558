//! Pane - A single command pane of the layout

use std::path::PathBuf;

use bitflags::bitflags;

use crate::core::session::Session;
use crate::core::timer::TimerId;

use super::tree::CommandSpec;

/// Per-pane input mode, mirrored from the input state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaneMode {
    #[default]
    Normal,
    PrefixArmed,
    PrefixActive,
    Menu,
}

bitflags! {
    /// Pane status flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PaneFlags: u8 {
        /// Last exit was nonzero
        const ERROR     = 0b0001;
        /// Mouse events are handled for this pane
        const MOUSE     = 0b0010;
        /// Viewport is scrolled back into history
        const SCROLLING = 0b0100;
    }
}

/// A pane and its process state
pub struct Pane {
    /// 1-based, stable for the program lifetime
    pub ordinal: usize,
    /// Position and outer size, including the border
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// 1 normally, 2 while zoomed
    pub paint_order: u8,
    pub mode: PaneMode,
    pub flags: PaneFlags,
    pub input_enabled: bool,
    /// Primary command followed by its fallbacks
    pub chain: Vec<CommandSpec>,
    /// Index of the running entry in `chain`
    pub cursor: usize,
    /// Running shell command and working directory
    pub cmd: String,
    pub cwd: Option<PathBuf>,
    /// Title of the bound command
    pub title: String,
    /// A manual restart is in progress
    pub restarting: bool,
    /// Exit code this pane was counted as terminated with
    pub counted: Option<u32>,
    /// Seconds left before a delayed start
    pub countdown: Option<u64>,
    pub countdown_timer: Option<TimerId>,
    pub session: Session,
}

impl Pane {
    /// Create a pane for `chain`, bound to its primary command
    pub fn new(ordinal: usize, chain: Vec<CommandSpec>) -> Self {
        let (cmd, cwd, title) = chain
            .first()
            .map(|spec| (spec.cmd.clone(), spec.cwd.clone(), spec.display_title().to_string()))
            .unwrap_or_default();
        Self {
            ordinal,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            paint_order: 1,
            mode: PaneMode::Normal,
            flags: PaneFlags::empty(),
            input_enabled: true,
            chain,
            cursor: 0,
            cmd,
            cwd,
            title,
            restarting: false,
            counted: None,
            countdown: None,
            countdown_timer: None,
            session: Session::new(1, 1),
        }
    }

    /// The chain's primary command, which carries the restart policy
    pub fn primary(&self) -> Option<&CommandSpec> {
        self.chain.first()
    }

    /// Rebind the running command to chain entry `index`
    pub fn bind(&mut self, index: usize) {
        if let Some(spec) = self.chain.get(index) {
            self.cursor = index;
            self.cmd = spec.cmd.clone();
            self.cwd = spec.cwd.clone();
            self.title = spec.display_title().to_string();
        }
    }

    /// Title without decorations
    pub fn base_title(&self) -> &str {
        &self.title
    }

    /// Move and resize; the session follows the inner area
    pub fn place(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        let (cols, rows) = self.inner_size();
        self.session.resize(cols, rows);
    }

    /// Get the inner dimensions (excluding border)
    pub fn inner_size(&self) -> (u16, u16) {
        (self.width.saturating_sub(2).max(1), self.height.saturating_sub(2).max(1))
    }

    /// Get the inner position (excluding border)
    pub fn inner_pos(&self) -> (u16, u16) {
        (self.x + 1, self.y + 1)
    }

    /// Check if a position is inside this pane
    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x && col < self.x + self.width && row >= self.y && row < self.y + self.height
    }

    pub fn is_scrolling(&self) -> bool {
        self.flags.contains(PaneFlags::SCROLLING)
    }

    /// Return the viewport to the live end
    pub fn reset_scroll(&mut self) {
        self.session.reset_scroll();
        self.flags.remove(PaneFlags::SCROLLING);
    }
}
