//! Input state machine
//!
//! ```text
//!            Ctrl+activator              any key
//!   Idle ───────────────────▶ PrefixArmed ───────▶ PrefixActive ◀──┐
//!    ▲                                (deferred)       │  │  known │
//!    └─────────────── unknown key ─────────────────────┘  └────────┘
//!                                                      │ m (deferred)
//!                                                      ▼
//!                                                    Menu ── Esc / commit ──▶ PrefixActive
//! ```
//!
//! The switch from armed to active runs as a deferred task, after the key
//! that triggered it has been dispatched. An unknown key while armed is
//! dropped and the activation still happens. A command that leaves prefix
//! mode while armed wins over the activation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::wm::focus::Direction;
use crate::wm::manager::Multiplexer;
use crate::wm::pane::{PaneFlags, PaneMode};

use super::keymapper::{control_byte, InputModes, KeyMapper, MouseReporting};
use super::menu::{MenuAction, MenuEvent};

/// State of the input machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    #[default]
    Idle,
    PrefixArmed,
    PrefixActive,
    Menu,
}

impl InputState {
    /// Mode shown on the focused pane
    pub fn pane_mode(self) -> PaneMode {
        match self {
            InputState::Idle => PaneMode::Normal,
            InputState::PrefixArmed => PaneMode::PrefixArmed,
            InputState::PrefixActive => PaneMode::PrefixActive,
            InputState::Menu => PaneMode::Menu,
        }
    }

    fn in_prefix(self) -> bool {
        matches!(self, InputState::PrefixArmed | InputState::PrefixActive)
    }
}

/// Work queued behind the current event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    ActivatePrefix,
    EnterMenu,
}

/// Prefix-mode commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Send the activator's control character to the focused pane
    Activator,
    Step(isize),
    Move(Direction),
    /// Jump to a pane by ordinal
    Jump(usize),
    ToggleNumber,
    Redraw,
    ToggleZoom,
    Scroll,
    Restart,
    Help,
    Menu,
    Shutdown,
}

fn parse_command(key: &KeyEvent, activator: char) -> Option<Command> {
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return None;
    }
    let command = match key.code {
        KeyCode::Char(c) if c == activator => Command::Activator,
        KeyCode::Backspace => Command::Step(-1),
        KeyCode::Char(' ') => Command::Step(1),
        KeyCode::Left => Command::Move(Direction::Left),
        KeyCode::Right => Command::Move(Direction::Right),
        KeyCode::Up => Command::Move(Direction::Up),
        KeyCode::Down => Command::Move(Direction::Down),
        KeyCode::Char(c @ '1'..='9') => Command::Jump(c as usize - '0' as usize),
        KeyCode::Char('n') => Command::ToggleNumber,
        KeyCode::Char('l') => Command::Redraw,
        KeyCode::Char('z') => Command::ToggleZoom,
        KeyCode::Char('v') => Command::Scroll,
        KeyCode::Char('r') => Command::Restart,
        KeyCode::Char('?') => Command::Help,
        KeyCode::Char('m') => Command::Menu,
        KeyCode::Char('k') => Command::Shutdown,
        _ => return None,
    };
    Some(command)
}

fn is_activator_chord(key: &KeyEvent, activator: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&activator))
}

impl Multiplexer {
    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if is_activator_chord(&key, self.options.activator)
            && matches!(self.input, InputState::Idle | InputState::PrefixActive)
        {
            self.set_input(InputState::PrefixArmed);
            return;
        }

        match self.input {
            InputState::Idle => self.forward_key(key),
            InputState::PrefixArmed => {
                self.deferred.push(Deferred::ActivatePrefix);
                match parse_command(&key, self.options.activator) {
                    Some(command) => self.run_command(command),
                    None => tracing::debug!("prefix: ignoring key {:?}", key.code),
                }
            }
            InputState::PrefixActive => self.prefix_key(key),
            InputState::Menu => match key.code {
                KeyCode::Esc => {
                    self.dispatch_menu(MenuEvent::Hide);
                    self.set_input(InputState::PrefixActive);
                }
                KeyCode::Up => self.dispatch_menu(MenuEvent::Up),
                KeyCode::Down => self.dispatch_menu(MenuEvent::Down),
                KeyCode::Enter => self.dispatch_menu(MenuEvent::Enter),
                code => tracing::debug!("menu: ignoring key {:?}", code),
            },
        }
    }

    /// Run queued work in FIFO order
    pub(crate) fn run_deferred(&mut self) {
        while let Some(task) = self.deferred.pop() {
            match task {
                Deferred::ActivatePrefix => {
                    if self.input == InputState::PrefixArmed {
                        self.set_input(InputState::PrefixActive);
                    }
                }
                Deferred::EnterMenu => {
                    if self.input.in_prefix() && self.menu.visible {
                        self.set_input(InputState::Menu);
                    }
                }
            }
        }
    }

    fn set_input(&mut self, state: InputState) {
        self.input = state;
        if let Some(pane) = self.focused_pane_mut() {
            pane.mode = state.pane_mode();
            pane.input_enabled = state == InputState::Idle;
        }
        self.request_repaint();
    }

    fn prefix_key(&mut self, key: KeyEvent) {
        match parse_command(&key, self.options.activator) {
            Some(command) => self.run_command(command),
            None => {
                self.help_visible = false;
                self.set_input(InputState::Idle);
            }
        }
    }

    fn run_command(&mut self, command: Command) {
        tracing::debug!("prefix command {:?}", command);
        let focused = self.focused;
        match command {
            Command::Activator => {
                if let (Some(byte), Some(pane)) =
                    (control_byte(self.options.activator), self.focused_pane_mut())
                {
                    pane.session.send(&[byte]);
                }
            }
            Command::Step(step) => {
                if self.zoomed.is_none() {
                    self.focus_step(step);
                }
            }
            Command::Move(direction) => {
                if self.zoomed.is_none() {
                    self.focus_direction(direction);
                }
            }
            Command::Jump(ordinal) => {
                if self.zoomed.is_none() {
                    if let Some(index) = self.panes.iter().position(|p| p.ordinal == ordinal) {
                        self.focus_pane(index);
                    }
                }
            }
            Command::ToggleNumber => {
                self.options.number = !self.options.number;
                self.relayout();
            }
            Command::Redraw => {
                self.relayout();
                self.request_full_redraw();
            }
            Command::ToggleZoom => {
                self.zoomed = match self.zoomed {
                    Some(_) => None,
                    None => focused,
                };
                self.relayout();
            }
            Command::Scroll => {
                // Scroll keys are read in Idle, where arrows are not focus moves
                if let Some(pane) = self.focused_pane_mut() {
                    pane.flags.insert(PaneFlags::SCROLLING);
                }
                self.help_visible = false;
                self.set_input(InputState::Idle);
            }
            Command::Restart => {
                if let Some(index) = focused {
                    self.restart_pane(index);
                }
            }
            Command::Help => {
                self.help_visible = !self.help_visible;
                self.request_repaint();
            }
            Command::Menu => {
                self.dispatch_menu(MenuEvent::Show);
                self.deferred.push(Deferred::EnterMenu);
            }
            Command::Shutdown => self.shutdown(),
        }
    }

    fn relayout(&mut self) {
        if let Err(e) = self.provision_again() {
            tracing::warn!("re-layout failed: {}", e);
        }
        self.request_repaint();
    }

    /// Feed a menu event to the overlay
    pub fn dispatch_menu(&mut self, event: MenuEvent) {
        match event {
            MenuEvent::Show => self.menu.show(),
            MenuEvent::Hide => self.menu.hide(),
            MenuEvent::Up => self.menu.up(),
            MenuEvent::Down => self.menu.down(self.panes.len()),
            MenuEvent::Enter => {
                if let Some((pane, action)) = self.menu.enter() {
                    self.dispatch_menu(MenuEvent::Close);
                    self.apply_menu_action(pane, action);
                }
            }
            MenuEvent::Close => {
                self.menu.hide();
                self.set_input(InputState::PrefixActive);
            }
        }
        self.request_repaint();
    }

    fn apply_menu_action(&mut self, index: usize, action: MenuAction) {
        if index >= self.panes.len() {
            return;
        }
        tracing::info!("menu: {} on pane {}", action.label(), self.panes[index].ordinal);
        match action {
            MenuAction::Start => self.resume_pane(index),
            MenuAction::Stop => self.stop_pane(index),
            MenuAction::Restart => self.restart_pane(index),
            MenuAction::Zoom => {
                let target = if self.zoomed == Some(index) { None } else { Some(index) };
                self.focus_pane(index);
                self.zoomed = target;
                self.relayout();
            }
            MenuAction::Visual => {
                self.focus_pane(index);
                // keep the scrolled pane on screen
                if self.zoomed.is_some_and(|zoomed| zoomed != index) {
                    self.zoomed = Some(index);
                    self.relayout();
                }
                self.panes[index].flags.insert(PaneFlags::SCROLLING);
                self.set_input(InputState::Idle);
            }
        }
    }

    /// Idle keys go to the focused pane, or drive its viewport while scrolling
    fn forward_key(&mut self, key: KeyEvent) {
        let Some(pane) = self.focused_pane_mut() else {
            return;
        };
        if pane.is_scrolling() {
            let half = (pane.inner_size().1 / 2).max(1) as isize;
            let lines = match key.code {
                KeyCode::Up => Some(1),
                KeyCode::Down => Some(-1),
                KeyCode::PageUp => Some(half),
                KeyCode::PageDown => Some(-half),
                _ => None,
            };
            if let Some(lines) = lines {
                pane.session.scroll_by(lines);
                self.request_repaint();
                return;
            }
            pane.reset_scroll();
            self.request_repaint();
        }

        let Some(pane) = self.focused_pane_mut() else {
            return;
        };
        if !pane.input_enabled {
            return;
        }
        let modes = InputModes::from_screen(pane.session.screen());
        if let Some(bytes) = KeyMapper::map(&key, &modes) {
            pane.session.send(&bytes);
        }
    }

    /// Topmost pane under a screen position
    fn pane_at(&self, col: u16, row: u16) -> Option<usize> {
        self.panes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.contains(col, row))
            .max_by_key(|(_, p)| p.paint_order)
            .map(|(i, _)| i)
    }

    pub(crate) fn handle_mouse(&mut self, event: MouseEvent) {
        if self.input == InputState::Menu {
            return;
        }
        let Some(index) = self.pane_at(event.column, event.row) else {
            return;
        };
        if !self.panes[index].flags.contains(PaneFlags::MOUSE) {
            return;
        }

        if let MouseEventKind::ScrollUp | MouseEventKind::ScrollDown = event.kind {
            let pane = &mut self.panes[index];
            let step = (pane.height / 10).max(1) as isize;
            let lines = if event.kind == MouseEventKind::ScrollUp { step } else { -step };
            if pane.session.scroll_by(lines) == 0 {
                pane.reset_scroll();
            } else {
                pane.flags.insert(PaneFlags::SCROLLING);
            }
            self.request_repaint();
            return;
        }

        if let MouseEventKind::Down(_) = event.kind {
            if self.input == InputState::Idle && self.focused != Some(index) {
                self.focus_pane(index);
            }
        }

        let pane = &mut self.panes[index];
        let modes = InputModes::from_screen(pane.session.screen());
        if modes.mouse == MouseReporting::Off || !KeyMapper::wants_mouse(event.kind, modes.mouse) {
            return;
        }
        let (x, y) = pane.inner_pos();
        let (cols, rows) = pane.inner_size();
        if event.column < x || event.row < y || event.column >= x + cols || event.row >= y + rows {
            return;
        }
        let local = MouseEvent {
            column: event.column - x,
            row: event.row - y,
            ..event
        };
        let bytes = KeyMapper::encode_mouse_event(&local, modes.sgr_mouse);
        if !bytes.is_empty() {
            pane.session.send(&bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::core::pty::PaneEvent;
    use crate::core::testing::{FakeSpawner, Journal};
    use crate::wm::tree::{CommandSpec, Node, Orientation, TreeBuilder};
    use crossterm::event::{Event, MouseButton};
    use std::time::Instant;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn panes(count: usize) -> Node {
        let mut b = TreeBuilder::new();
        let children = (0..count)
            .map(|i| b.command(CommandSpec::new(format!("cmd{}", i))))
            .collect();
        b.split(Orientation::Horizontal, children)
    }

    fn mux(tree: Node, options: Options) -> (Multiplexer, Journal) {
        let journal = Journal::default();
        let mut m = Multiplexer::new(
            tree,
            options,
            Box::new(FakeSpawner::new(journal.clone())),
            40,
            12,
            Instant::now(),
        );
        m.start().unwrap();
        (m, journal)
    }

    fn send(m: &mut Multiplexer, events: &[Event]) {
        for event in events {
            m.handle_event(event.clone(), Instant::now()).unwrap();
        }
    }

    fn fill_history(m: &mut Multiplexer, journal: &Journal, pane: usize) {
        let process = journal.last_process(pane).unwrap();
        let data: Vec<u8> = (0..40).flat_map(|i| format!("line {}\r\n", i).into_bytes()).collect();
        m.handle_pane_event(PaneEvent::Output { pane, process, data }, Instant::now());
    }

    #[test]
    fn test_idle_keys_reach_the_focused_pane() {
        let (mut m, journal) = mux(panes(2), Options::default());
        send(&mut m, &[key(KeyCode::Char('x')), key(KeyCode::Enter)]);
        assert_eq!(journal.written_to(1), b"x\r".to_vec());
        assert!(journal.written_to(2).is_empty());
    }

    #[test]
    fn test_prefix_disables_input_and_unknown_key_leaves() {
        let (mut m, journal) = mux(panes(2), Options::default());
        send(&mut m, &[ctrl('a')]);
        assert_eq!(m.input, InputState::PrefixArmed);
        assert!(!m.panes[0].input_enabled);
        assert_eq!(m.panes[0].mode, PaneMode::PrefixArmed);

        // unknown while armed: still activates
        send(&mut m, &[key(KeyCode::Char('x'))]);
        assert_eq!(m.input, InputState::PrefixActive);
        assert!(!m.panes[0].input_enabled);

        send(&mut m, &[key(KeyCode::Char('x'))]);
        assert_eq!(m.input, InputState::Idle);
        assert!(m.panes[0].input_enabled);
        assert_eq!(m.panes[0].mode, PaneMode::Normal);
        assert!(journal.written_to(1).is_empty());
    }

    #[test]
    fn test_double_activator_chord_activates_prefix() {
        let (mut m, journal) = mux(panes(1), Options::default());
        send(&mut m, &[ctrl('a'), ctrl('a')]);
        assert_eq!(m.input, InputState::PrefixActive);
        assert!(journal.written_to(1).is_empty());

        send(&mut m, &[ctrl('a')]);
        assert_eq!(m.input, InputState::PrefixArmed);
    }

    #[test]
    fn test_prefix_stays_active_for_known_commands() {
        let (mut m, _journal) = mux(panes(3), Options::default());
        send(&mut m, &[ctrl('a'), key(KeyCode::Char(' '))]);
        assert_eq!(m.focused, Some(1));
        assert_eq!(m.input, InputState::PrefixActive);
        assert_eq!(m.panes[1].mode, PaneMode::PrefixActive);
        assert_eq!(m.panes[0].mode, PaneMode::Normal);

        send(&mut m, &[key(KeyCode::Char(' ')), key(KeyCode::Char(' '))]);
        assert_eq!(m.focused, Some(0));
        send(&mut m, &[key(KeyCode::Backspace)]);
        assert_eq!(m.focused, Some(2));
        send(&mut m, &[key(KeyCode::Char('2'))]);
        assert_eq!(m.focused, Some(1));
        assert_eq!(m.input, InputState::PrefixActive);
    }

    #[test]
    fn test_activator_literal_is_injected() {
        let (mut m, journal) = mux(panes(1), Options::default());
        send(&mut m, &[ctrl('a'), key(KeyCode::Char('a'))]);
        assert_eq!(journal.written_to(1), vec![0x01]);
        assert_eq!(m.input, InputState::PrefixActive);
    }

    #[test]
    fn test_custom_activator() {
        let options = Options {
            activator: 'b',
            ..Options::default()
        };
        let (mut m, journal) = mux(panes(1), options);
        send(&mut m, &[ctrl('a')]);
        assert_eq!(m.input, InputState::Idle);
        assert_eq!(journal.written_to(1), vec![0x01]);
        send(&mut m, &[ctrl('b'), key(KeyCode::Char('b'))]);
        assert_eq!(journal.written_to(1), vec![0x01, 0x02]);
    }

    #[test]
    fn test_zoom_blocks_focus_changes() {
        let (mut m, _journal) = mux(panes(2), Options::default());
        send(&mut m, &[ctrl('a'), key(KeyCode::Char('z'))]);
        assert_eq!(m.zoomed, Some(0));
        assert_eq!((m.panes[0].width, m.panes[0].height), (40, 12));

        send(&mut m, &[key(KeyCode::Char(' ')), key(KeyCode::Right), key(KeyCode::Char('2'))]);
        assert_eq!(m.focused, Some(0));
        assert_eq!(m.zoomed, Some(0));
        assert_eq!(m.input, InputState::PrefixActive);

        send(&mut m, &[key(KeyCode::Char('z'))]);
        assert_eq!(m.zoomed, None);
        assert_eq!((m.panes[0].width, m.panes[1].x), (20, 20));

        send(&mut m, &[key(KeyCode::Char('2'))]);
        assert_eq!(m.focused, Some(1));
    }

    #[test]
    fn test_numbering_toggle() {
        let (mut m, _journal) = mux(panes(2), Options::default());
        send(&mut m, &[ctrl('a'), key(KeyCode::Char('n'))]);
        assert!(m.options.number);
        assert!(m.label(1).unwrap().text.starts_with("[2]-"));
    }

    #[test]
    fn test_help_hides_when_leaving_prefix() {
        let (mut m, _journal) = mux(panes(1), Options::default());
        send(&mut m, &[ctrl('a'), key(KeyCode::Char('?'))]);
        assert!(m.help_visible);
        send(&mut m, &[key(KeyCode::Esc)]);
        assert!(!m.help_visible);
        assert_eq!(m.input, InputState::Idle);
    }

    #[test]
    fn test_menu_is_entered_after_prefix_activation() {
        let (mut m, _journal) = mux(panes(2), Options::default());
        send(&mut m, &[ctrl('a'), key(KeyCode::Char('m'))]);
        assert!(m.menu.visible);
        assert_eq!(m.input, InputState::Menu);
        assert_eq!(m.panes[0].mode, PaneMode::Menu);

        send(&mut m, &[key(KeyCode::Char('x'))]);
        assert_eq!(m.input, InputState::Menu);

        send(&mut m, &[key(KeyCode::Esc)]);
        assert!(!m.menu.visible);
        assert_eq!(m.input, InputState::PrefixActive);
        assert!(!m.panes[0].input_enabled);
    }

    #[test]
    fn test_menu_commit_stops_selected_pane() {
        let (mut m, journal) = mux(panes(2), Options::default());
        send(
            &mut m,
            &[
                ctrl('a'),
                key(KeyCode::Char('m')),
                key(KeyCode::Down),
                key(KeyCode::Enter),
                key(KeyCode::Down),
                key(KeyCode::Enter),
            ],
        );
        assert!(journal.was_terminated(2));
        assert!(!journal.was_terminated(1));
        assert_eq!(m.terminated, 1);
        assert!(!m.menu.visible);
        assert_eq!(m.input, InputState::PrefixActive);

        // Start brings it back
        send(&mut m, &[key(KeyCode::Char('m')), key(KeyCode::Down), key(KeyCode::Enter), key(KeyCode::Enter)]);
        assert_eq!(journal.spawn_count(), 3);
        assert_eq!(m.terminated, 0);
    }

    #[test]
    fn test_menu_visual_focuses_and_scrolls() {
        let (mut m, _journal) = mux(panes(2), Options::default());
        let mut events = vec![ctrl('a'), key(KeyCode::Char('m')), key(KeyCode::Down), key(KeyCode::Enter)];
        events.extend(std::iter::repeat(key(KeyCode::Down)).take(4));
        events.push(key(KeyCode::Enter));
        send(&mut m, &events);
        assert_eq!(m.focused, Some(1));
        assert!(m.panes[1].is_scrolling());
        assert_eq!(m.input, InputState::Idle);
        assert!(m.panes[1].input_enabled);
    }

    #[test]
    fn test_menu_visual_moves_zoom_to_its_pane() {
        let (mut m, _journal) = mux(panes(2), Options::default());
        let mut events = vec![ctrl('a'), key(KeyCode::Char('z')), key(KeyCode::Char('m'))];
        events.extend([key(KeyCode::Down), key(KeyCode::Enter)]);
        events.extend(std::iter::repeat(key(KeyCode::Down)).take(4));
        events.push(key(KeyCode::Enter));
        send(&mut m, &events);
        assert_eq!(m.focused, Some(1));
        assert_eq!(m.zoomed, Some(1));
        assert_eq!((m.panes[1].x, m.panes[1].width), (0, 40));
    }

    #[test]
    fn test_scroll_mode_keys_drive_the_viewport() {
        let (mut m, journal) = mux(panes(1), Options::default());
        fill_history(&mut m, &journal, 0);

        send(&mut m, &[ctrl('a'), key(KeyCode::Char('v'))]);
        assert_eq!(m.input, InputState::Idle);
        assert!(m.panes[0].is_scrolling());

        send(&mut m, &[key(KeyCode::Up), key(KeyCode::Up)]);
        assert_eq!(m.panes[0].session.scroll_offset(), 2);
        send(&mut m, &[key(KeyCode::PageUp)]);
        // inner height 10, half a pane is 5
        assert_eq!(m.panes[0].session.scroll_offset(), 7);
        send(&mut m, &[key(KeyCode::Down)]);
        assert_eq!(m.panes[0].session.scroll_offset(), 6);
        assert!(journal.written_to(1).is_empty());

        send(&mut m, &[key(KeyCode::Char('q'))]);
        assert!(!m.panes[0].is_scrolling());
        assert_eq!(m.panes[0].session.scroll_offset(), 0);
        assert_eq!(journal.written_to(1), b"q".to_vec());
    }

    #[test]
    fn test_mouse_wheel_scrolls_enabled_panes() {
        let options = Options {
            mouse: true,
            ..Options::default()
        };
        let (mut m, journal) = mux(panes(2), options);
        fill_history(&mut m, &journal, 1);

        send(&mut m, &[mouse(MouseEventKind::ScrollUp, 25, 5)]);
        assert!(m.panes[1].is_scrolling());
        assert_eq!(m.panes[1].session.scroll_offset(), 1);
        assert_eq!(m.focused, Some(0));

        send(&mut m, &[mouse(MouseEventKind::ScrollDown, 25, 5)]);
        assert!(!m.panes[1].is_scrolling());
        assert_eq!(m.panes[1].session.scroll_offset(), 0);
    }

    #[test]
    fn test_mouse_ignored_without_mouse_flag() {
        let (mut m, journal) = mux(panes(2), Options::default());
        fill_history(&mut m, &journal, 1);
        send(&mut m, &[mouse(MouseEventKind::ScrollUp, 25, 5)]);
        assert!(!m.panes[1].is_scrolling());
        send(&mut m, &[mouse(MouseEventKind::Down(MouseButton::Left), 25, 5)]);
        assert_eq!(m.focused, Some(0));
    }

    #[test]
    fn test_mouse_click_focuses_and_passes_through() {
        let options = Options {
            mouse: true,
            ..Options::default()
        };
        let (mut m, journal) = mux(panes(2), options);
        send(&mut m, &[mouse(MouseEventKind::Down(MouseButton::Left), 25, 5)]);
        assert_eq!(m.focused, Some(1));
        assert!(journal.written_to(2).is_empty());

        // child turns on SGR mouse reporting
        let process = journal.last_process(1).unwrap();
        m.handle_pane_event(
            PaneEvent::Output {
                pane: 1,
                process,
                data: b"\x1b[?1000h\x1b[?1006h".to_vec(),
            },
            Instant::now(),
        );
        send(&mut m, &[mouse(MouseEventKind::Down(MouseButton::Left), 25, 5)]);
        // pane 1 inner area starts at (21, 1)
        assert_eq!(journal.written_to(2), b"\x1b[<0;5;5M".to_vec());
    }
}
