//! Key mapping for pane input
//!
//! Converts crossterm key and mouse events to the byte sequences a child
//! process expects on its pty.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Which mouse events the child asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseReporting {
    #[default]
    Off,
    Press,
    PressRelease,
    ButtonMotion,
    AnyMotion,
}

/// Input modes a child has set on its terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputModes {
    pub application_cursor: bool,
    pub mouse: MouseReporting,
    pub sgr_mouse: bool,
}

impl InputModes {
    pub fn from_screen(screen: &vt100::Screen) -> Self {
        let mouse = match screen.mouse_protocol_mode() {
            vt100::MouseProtocolMode::None => MouseReporting::Off,
            vt100::MouseProtocolMode::Press => MouseReporting::Press,
            vt100::MouseProtocolMode::PressRelease => MouseReporting::PressRelease,
            vt100::MouseProtocolMode::ButtonMotion => MouseReporting::ButtonMotion,
            vt100::MouseProtocolMode::AnyMotion => MouseReporting::AnyMotion,
        };
        Self {
            application_cursor: screen.application_cursor(),
            mouse,
            sgr_mouse: matches!(
                screen.mouse_protocol_encoding(),
                vt100::MouseProtocolEncoding::Sgr
            ),
        }
    }
}

/// Control byte produced by Ctrl plus the activator letter
pub fn control_byte(activator: char) -> Option<u8> {
    let lower = activator.to_ascii_lowercase();
    lower.is_ascii_lowercase().then(|| lower as u8 - b'a' + 1)
}

/// Key mapper for converting key events to bytes
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent to bytes for the pty
    pub fn map(event: &KeyEvent, modes: &InputModes) -> Option<Vec<u8>> {
        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Char(ch) => Some(Self::map_char(ch, mods)),
            KeyCode::Enter => Some(vec![0x0D]),
            KeyCode::Backspace => {
                if mods.contains(Modifiers::ALT) {
                    Some(vec![0x1B, 0x7F])
                } else {
                    Some(vec![0x7F])
                }
            }
            KeyCode::Tab => Some(vec![0x09]),
            KeyCode::BackTab => Some(b"\x1b[Z".to_vec()),
            KeyCode::Esc => Some(vec![0x1B]),

            KeyCode::Up => Some(Self::arrow_key(b'A', mods, modes)),
            KeyCode::Down => Some(Self::arrow_key(b'B', mods, modes)),
            KeyCode::Right => Some(Self::arrow_key(b'C', mods, modes)),
            KeyCode::Left => Some(Self::arrow_key(b'D', mods, modes)),

            KeyCode::Home => Some(Self::special_key(b'H', mods)),
            KeyCode::End => Some(Self::special_key(b'F', mods)),
            KeyCode::PageUp => Some(Self::tilde_key(5, mods)),
            KeyCode::PageDown => Some(Self::tilde_key(6, mods)),
            KeyCode::Insert => Some(Self::tilde_key(2, mods)),
            KeyCode::Delete => Some(Self::tilde_key(3, mods)),

            KeyCode::F(n) => {
                let bytes = Self::function_key(n, mods);
                (!bytes.is_empty()).then_some(bytes)
            }

            _ => None,
        }
    }

    fn map_char(ch: char, mods: Modifiers) -> Vec<u8> {
        let ctrl = mods.contains(Modifiers::CTRL);
        let alt = mods.contains(Modifiers::ALT);

        if ctrl {
            let code = if ch.is_ascii_alphabetic() {
                Some(ch.to_ascii_lowercase() as u8 - b'a' + 1)
            } else {
                match ch {
                    '@' | '`' | ' ' => Some(0x00),
                    '[' => Some(0x1B),
                    '\\' => Some(0x1C),
                    ']' => Some(0x1D),
                    '^' | '~' => Some(0x1E),
                    '_' | '?' => Some(0x1F),
                    _ => None,
                }
            };
            if let Some(code) = code {
                return if alt { vec![0x1B, code] } else { vec![code] };
            }
        }

        let mut bytes = Vec::with_capacity(5);
        if alt {
            bytes.push(0x1B);
        }
        let mut buf = [0u8; 4];
        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        bytes
    }

    fn arrow_key(key: u8, mods: Modifiers, modes: &InputModes) -> Vec<u8> {
        if !mods.is_empty() {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        } else if modes.application_cursor {
            vec![0x1B, b'O', key]
        } else {
            vec![0x1B, b'[', key]
        }
    }

    /// Home and End
    fn special_key(key: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            vec![0x1B, b'[', key]
        } else {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key as char).into_bytes()
        }
    }

    /// PageUp, PageDown, Insert, Delete
    fn tilde_key(code: u8, mods: Modifiers) -> Vec<u8> {
        if mods.is_empty() {
            format!("\x1b[{}~", code).into_bytes()
        } else {
            format!("\x1b[{};{}~", code, Self::modifier_code(mods)).into_bytes()
        }
    }

    fn function_key(n: u8, mods: Modifiers) -> Vec<u8> {
        let (code, ss3) = match n {
            1 => (b'P', true),
            2 => (b'Q', true),
            3 => (b'R', true),
            4 => (b'S', true),
            5 => (15, false),
            6 => (17, false),
            7 => (18, false),
            8 => (19, false),
            9 => (20, false),
            10 => (21, false),
            11 => (23, false),
            12 => (24, false),
            _ => return vec![],
        };
        match (ss3, mods.is_empty()) {
            (true, true) => vec![0x1B, b'O', code],
            (true, false) => {
                format!("\x1b[1;{}{}", Self::modifier_code(mods), code as char).into_bytes()
            }
            (false, _) => Self::tilde_key(code, mods),
        }
    }

    /// xterm modifier parameter
    fn modifier_code(mods: Modifiers) -> u8 {
        1 + if mods.contains(Modifiers::SHIFT) { 1 } else { 0 }
            + if mods.contains(Modifiers::ALT) { 2 } else { 0 }
            + if mods.contains(Modifiers::CTRL) { 4 } else { 0 }
    }

    /// Whether the child's reporting mode covers this kind of event
    pub fn wants_mouse(kind: MouseEventKind, reporting: MouseReporting) -> bool {
        match kind {
            MouseEventKind::Down(_)
            | MouseEventKind::ScrollUp
            | MouseEventKind::ScrollDown
            | MouseEventKind::ScrollLeft
            | MouseEventKind::ScrollRight => reporting != MouseReporting::Off,
            MouseEventKind::Up(_) => matches!(
                reporting,
                MouseReporting::PressRelease | MouseReporting::ButtonMotion | MouseReporting::AnyMotion
            ),
            MouseEventKind::Drag(_) => matches!(
                reporting,
                MouseReporting::ButtonMotion | MouseReporting::AnyMotion
            ),
            MouseEventKind::Moved => reporting == MouseReporting::AnyMotion,
        }
    }

    /// Encode a mouse event with pane-relative coordinates.
    ///
    /// Returns an empty sequence when the position cannot be expressed in
    /// the legacy encoding.
    pub fn encode_mouse_event(event: &MouseEvent, sgr: bool) -> Vec<u8> {
        let (button, pressed) = match event.kind {
            MouseEventKind::Down(btn) => (Self::mouse_button_code(btn), true),
            MouseEventKind::Up(btn) => (if sgr { Self::mouse_button_code(btn) } else { 3 }, false),
            MouseEventKind::Drag(btn) => (Self::mouse_button_code(btn) + 32, true),
            MouseEventKind::Moved => (35, true),
            MouseEventKind::ScrollUp => (64, true),
            MouseEventKind::ScrollDown => (65, true),
            MouseEventKind::ScrollLeft => (66, true),
            MouseEventKind::ScrollRight => (67, true),
        };

        let mut cb = button;
        if event.modifiers.contains(KeyModifiers::SHIFT) {
            cb += 4;
        }
        if event.modifiers.contains(KeyModifiers::ALT) {
            cb += 8;
        }
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            cb += 16;
        }

        let x = event.column.saturating_add(1);
        let y = event.row.saturating_add(1);

        if sgr {
            let suffix = if pressed { 'M' } else { 'm' };
            format!("\x1b[<{};{};{}{}", cb, x, y, suffix).into_bytes()
        } else if x <= 223 && y <= 223 {
            vec![0x1b, b'[', b'M', cb + 32, x as u8 + 32, y as u8 + 32]
        } else {
            vec![]
        }
    }

    fn mouse_button_code(button: MouseButton) -> u8 {
        match button {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }
    }
}
