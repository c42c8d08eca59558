//! Multiplexer - application state and event dispatch
//!
//! All state lives here and is only touched from the event loop. Behavior is
//! split over several files as `impl Multiplexer` blocks:
//!
//! ```text
//! wm/layout.rs        provisioning
//! wm/focus.rs         focus navigation
//! core/lifecycle.rs   spawn, exit, restart and shutdown policy
//! ui/input.rs         key and mouse state machine, menu events
//! ```

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{Event, KeyEventKind};

use crate::config::Options;
use crate::core::lifecycle::Task;
use crate::core::pty::{PaneEvent, Spawner};
use crate::core::timer::{DeferredQueue, TimerQueue};
use crate::ui::input::{Deferred, InputState};
use crate::ui::menu::Menu;
use crate::ui::title::{self, PaneLabel, TitleContext};

use super::layout::LayoutError;
use super::pane::Pane;
use super::tree::{Node, NodeId};

/// Multiplexer - owns the panes and everything that drives them
pub struct Multiplexer {
    /// Options bag (numbering is toggled at runtime)
    pub options: Options,
    /// Pane tree, never mutated
    pub(crate) tree: Rc<Node>,
    /// Panes in creation order
    pub panes: Vec<Pane>,
    pub(crate) by_node: HashMap<NodeId, usize>,
    /// Focused pane (None until first provisioning)
    pub focused: Option<usize>,
    /// Zoomed pane
    pub zoomed: Option<usize>,
    /// Panes counted as terminated
    pub terminated: usize,
    /// Of those, how many exited with an error
    pub terminated_error: usize,
    /// Screen dimensions
    pub width: u16,
    pub height: u16,
    pub input: InputState,
    pub menu: Menu,
    pub help_visible: bool,
    pub(crate) timers: TimerQueue<Task>,
    pub(crate) deferred: DeferredQueue<Deferred>,
    pub(crate) spawner: Box<dyn Spawner>,
    /// Pane that requested focus during the first walk
    pub(crate) focus_request: Option<usize>,
    /// A shutdown is underway; no new processes
    pub(crate) shutting_down: bool,
    pub(crate) now: Instant,
    repaint: bool,
    full_redraw: bool,
    bell: bool,
    exit_requested: bool,
}

impl Multiplexer {
    /// Create a multiplexer. Nothing is provisioned until `start`.
    pub fn new(
        tree: Node,
        options: Options,
        spawner: Box<dyn Spawner>,
        width: u16,
        height: u16,
        now: Instant,
    ) -> Self {
        Self {
            options,
            tree: Rc::new(tree),
            panes: Vec::new(),
            by_node: HashMap::new(),
            focused: None,
            zoomed: None,
            terminated: 0,
            terminated_error: 0,
            width,
            height,
            input: InputState::Idle,
            menu: Menu::new(),
            help_visible: false,
            timers: TimerQueue::new(),
            deferred: DeferredQueue::new(),
            spawner,
            focus_request: None,
            shutting_down: false,
            now,
            repaint: true,
            full_redraw: true,
            bell: false,
            exit_requested: false,
        }
    }

    /// Provision the layout and start every command
    pub fn start(&mut self) -> Result<(), LayoutError> {
        self.provision_initially()
    }

    /// Handle a terminal event. Only layout failures escape.
    pub fn handle_event(&mut self, event: Event, now: Instant) -> Result<(), LayoutError> {
        self.now = now;
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.resize(width, height)?,
            _ => {}
        }
        self.run_deferred();
        Ok(())
    }

    /// Handle output or exit of a pane's process
    pub fn handle_pane_event(&mut self, event: PaneEvent, now: Instant) {
        self.now = now;
        match event {
            PaneEvent::Output { pane, process, data } => {
                let Some(p) = self.panes.get_mut(pane) else {
                    return;
                };
                if p.session.process_id() != Some(process) {
                    return;
                }
                if p.session.feed(&data) {
                    self.bell = true;
                }
                self.repaint = true;
            }
            PaneEvent::Exited { pane, process, code } => self.handle_exit(pane, process, code),
        }
    }

    /// Run every timer that is due
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        while let Some(task) = self.timers.pop_due(now) {
            self.run_task(task);
        }
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    /// Resize the screen and re-layout
    pub fn resize(&mut self, width: u16, height: u16) -> Result<(), LayoutError> {
        self.width = width;
        self.height = height;
        self.full_redraw = true;
        self.provision_again()
    }

    pub fn focused_pane(&self) -> Option<&Pane> {
        self.focused.and_then(|i| self.panes.get(i))
    }

    pub fn focused_pane_mut(&mut self) -> Option<&mut Pane> {
        self.focused.and_then(move |i| self.panes.get_mut(i))
    }

    /// Label of pane `index` as it should be shown right now
    pub fn label(&self, index: usize) -> Option<PaneLabel> {
        let pane = self.panes.get(index)?;
        let ctx = TitleContext {
            number: self.options.number,
            focused: self.focused == Some(index),
            zoomed: self.zoomed == Some(index),
        };
        Some(title::render(pane, &ctx))
    }

    pub fn request_repaint(&mut self) {
        self.repaint = true;
    }

    pub fn request_full_redraw(&mut self) {
        self.repaint = true;
        self.full_redraw = true;
    }

    /// Take the pending repaint request: None, or Some(full redraw)
    pub fn take_repaint(&mut self) -> Option<bool> {
        if !self.repaint {
            return None;
        }
        self.repaint = false;
        Some(std::mem::take(&mut self.full_redraw))
    }

    /// Take the pending bell
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    pub(crate) fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn should_exit(&self) -> bool {
        self.exit_requested
    }
}
