//! Focus - directional and sequential focus movement
//!
//! Directional moves look for panes whose opposite border lies exactly one
//! cell beyond the focused pane's border and pick the one sharing the longest
//! stretch of that border.

use crate::ui::input::InputState;

use super::manager::Multiplexer;
use super::pane::{Pane, PaneMode};

/// Direction of a focus move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Side of a pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Direction {
    /// Side of the focused pane that is crossed, and the side of the target
    /// that is entered
    fn sides(self) -> (Side, Side) {
        match self {
            Direction::Left => (Side::Left, Side::Right),
            Direction::Right => (Side::Right, Side::Left),
            Direction::Up => (Side::Top, Side::Bottom),
            Direction::Down => (Side::Bottom, Side::Top),
        }
    }
}

/// A pane border: its coordinate on the crossed axis and the half-open
/// extent `[start, end)` along the other one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub at: i32,
    pub start: i32,
    pub end: i32,
}

pub fn border(pane: &Pane, side: Side) -> Border {
    let (x, y, w, h) = (pane.x as i32, pane.y as i32, pane.width as i32, pane.height as i32);
    match side {
        Side::Left => Border { at: x, start: y, end: y + h },
        Side::Right => Border { at: x + w - 1, start: y, end: y + h },
        Side::Top => Border { at: y, start: x, end: x + w },
        Side::Bottom => Border { at: y + h - 1, start: x, end: x + w },
    }
}

/// Length of the overlap of two half-open segments
pub fn touches(start1: i32, end1: i32, start2: i32, end2: i32) -> i32 {
    (end1.min(end2) - start1.max(start2)).max(0)
}

/// Best neighbor of pane `from` in `direction`. Ties go to the earliest pane.
pub fn neighbor(panes: &[Pane], from: usize, direction: Direction) -> Option<usize> {
    let (leave_side, enter_side) = direction.sides();
    let leave = border(panes.get(from)?, leave_side);
    let step = match direction {
        Direction::Left | Direction::Up => -1,
        Direction::Right | Direction::Down => 1,
    };

    let mut best: Option<(usize, i32)> = None;
    for (i, pane) in panes.iter().enumerate() {
        if i == from {
            continue;
        }
        let enter = border(pane, enter_side);
        if enter.at != leave.at + step {
            continue;
        }
        let score = touches(leave.start, leave.end, enter.start, enter.end);
        if score > best.map(|(_, s)| s).unwrap_or(0) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Index `step` places from `from`, wrapping around `len`
pub fn cycle(len: usize, from: usize, step: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (from as isize + step).rem_euclid(len as isize) as usize
}

impl Multiplexer {
    /// Move focus to pane `index`
    pub fn focus_pane(&mut self, index: usize) {
        if index >= self.panes.len() || self.focused == Some(index) {
            return;
        }
        if let Some(old) = self.focused_pane_mut() {
            old.reset_scroll();
            old.mode = PaneMode::Normal;
            old.input_enabled = true;
        }
        self.focused = Some(index);
        let mode = self.input.pane_mode();
        let idle = self.input == InputState::Idle;
        let pane = &mut self.panes[index];
        pane.mode = mode;
        pane.input_enabled = idle;
        self.request_repaint();
    }

    /// Sequential move, wrapping around the pane list
    pub fn focus_step(&mut self, step: isize) {
        if let Some(from) = self.focused {
            self.focus_pane(cycle(self.panes.len(), from, step));
        }
    }

    /// Directional move. Returns false if there is no pane that way.
    pub fn focus_direction(&mut self, direction: Direction) -> bool {
        let Some(from) = self.focused else {
            return false;
        };
        match neighbor(&self.panes, from, direction) {
            Some(to) => {
                self.focus_pane(to);
                true
            }
            None => false,
        }
    }
}
