//! Compositor for the pane tree.
//!
//! Every frame redraws all visible panes, then the overlays, inside a
//! synchronized update:
//!
//! ```text
//! begin_frame()  → start sync, disable autowrap, hide cursor
//!     ↓
//! panes          → border + label, then cells (paint order, zoomed last)
//!     ↓
//! overlays       → menu, help
//!     ↓
//! end_frame()    → place cursor, enable autowrap, end sync, flush
//! ```

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    event::{DisableMouseCapture, EnableMouseCapture},
    queue,
    style::{Attribute, Color as CtColor, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use unicode_width::UnicodeWidthChar;

use crate::config::{ColorScheme, CursorStyle};
use crate::ui::input::InputState;
use crate::ui::menu::{MenuAction, MenuLevel};
use crate::ui::title::Tone;
use crate::wm::manager::Multiplexer;

use super::help;

fn begin_frame<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "\x1b[?2026h")?; // Begin synchronized update
    write!(out, "\x1b[?7l")?; // Disable autowrap
    queue!(out, Hide)
}

/// End a frame, showing the cursor at `cursor` if given
fn end_frame<W: Write>(out: &mut W, cursor: Option<(u16, u16)>) -> io::Result<()> {
    queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
    if let Some((x, y)) = cursor {
        queue!(out, MoveTo(x, y), Show)?;
    }
    write!(out, "\x1b[?7h")?;
    write!(out, "\x1b[?2026l")?;
    out.flush()
}

/// Run a frame, ending it even on error
fn with_frame<W: Write, F>(out: &mut W, f: F) -> io::Result<()>
where
    F: FnOnce(&mut W) -> io::Result<Option<(u16, u16)>>,
{
    begin_frame(out)?;
    match f(out) {
        Ok(cursor) => end_frame(out, cursor),
        Err(e) => {
            let _ = end_frame(out, None);
            Err(e)
        }
    }
}

struct BorderChars {
    top_left: char,
    top_right: char,
    bottom_left: char,
    bottom_right: char,
    horizontal: char,
    vertical: char,
}

const SINGLE: BorderChars = BorderChars {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

/// Visual attributes of a run of cells
#[derive(Debug, Clone, Copy, PartialEq)]
struct CellStyle {
    fg: vt100::Color,
    bg: vt100::Color,
    bold: bool,
    italic: bool,
    underline: bool,
    inverse: bool,
}

impl CellStyle {
    fn of(cell: &vt100::Cell) -> Self {
        Self {
            fg: cell.fgcolor(),
            bg: cell.bgcolor(),
            bold: cell.bold(),
            italic: cell.italic(),
            underline: cell.underline(),
            inverse: cell.inverse(),
        }
    }
}

fn to_crossterm(color: vt100::Color) -> Option<CtColor> {
    match color {
        vt100::Color::Default => None,
        vt100::Color::Idx(idx) => Some(CtColor::AnsiValue(idx)),
        vt100::Color::Rgb(r, g, b) => Some(CtColor::Rgb { r, g, b }),
    }
}

/// Longest prefix of `text` fitting in `max` columns, and its width
fn fit(text: &str, max: usize) -> (String, usize) {
    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max {
            break;
        }
        out.push(ch);
        width += w;
    }
    (out, width)
}

/// Multi-pane renderer
pub struct Renderer {
    initialized: bool,
    mouse: bool,
    pub color_scheme: ColorScheme,
    cursor: CursorStyle,
}

impl Renderer {
    pub fn new(color_scheme: ColorScheme, cursor: CursorStyle) -> Self {
        Self {
            initialized: false,
            mouse: false,
            color_scheme,
            cursor,
        }
    }

    /// Take over the terminal
    pub fn init(&mut self, mouse: bool) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        let shape = match self.cursor {
            CursorStyle::Block => SetCursorStyle::SteadyBlock,
            CursorStyle::Underline => SetCursorStyle::SteadyUnderScore,
            CursorStyle::Bar => SetCursorStyle::SteadyBar,
        };
        queue!(stdout, EnterAlternateScreen, Clear(ClearType::All), shape)?;
        if mouse {
            queue!(stdout, EnableMouseCapture)?;
        }
        stdout.flush()?;

        self.mouse = mouse;
        self.initialized = true;
        Ok(())
    }

    /// Give the terminal back
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();
        write!(stdout, "\x1b[?7h")?;
        write!(stdout, "\x1b[?2026l")?;
        if self.mouse {
            queue!(stdout, DisableMouseCapture)?;
        }
        queue!(
            stdout,
            ResetColor,
            SetCursorStyle::DefaultUserShape,
            Show,
            LeaveAlternateScreen
        )?;
        stdout.flush()?;
        terminal::disable_raw_mode()
    }

    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Draw a frame to stdout
    pub fn render(&mut self, mux: &Multiplexer, full: bool) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        self.draw(&mut stdout, mux, full)
    }

    /// Pass a pane's bell through to the host terminal
    pub fn bell(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "\x07")?;
        stdout.flush()
    }

    pub fn draw<W: Write>(&self, out: &mut W, mux: &Multiplexer, full: bool) -> io::Result<()> {
        with_frame(out, |out| {
            if full {
                queue!(out, ResetColor, Clear(ClearType::All))?;
            }

            let mut order: Vec<usize> = match mux.zoomed {
                Some(index) => vec![index],
                None => (0..mux.panes.len()).collect(),
            };
            order.sort_by_key(|&i| mux.panes[i].paint_order);
            for index in order {
                self.draw_border(out, mux, index)?;
                self.draw_cells(out, mux, index)?;
            }

            if mux.menu.visible {
                self.draw_menu(out, mux)?;
            }
            if mux.help_visible {
                let lines = help::lines(mux.options.activator);
                self.draw_box(out, mux, " Help ", &lines, None)?;
            }
            Ok(self.cursor_position(mux))
        })
    }

    fn border_color(&self, tone: Tone) -> CtColor {
        let cs = &self.color_scheme;
        match tone {
            Tone::Plain => cs.border,
            Tone::Focused => cs.border_focused,
            Tone::Error => cs.border_error,
            Tone::Scrolling => cs.border_scrolling,
        }
        .to_crossterm()
    }

    /// Border with the label centered in the top edge
    fn draw_border<W: Write>(&self, out: &mut W, mux: &Multiplexer, index: usize) -> io::Result<()> {
        let pane = &mux.panes[index];
        let Some(label) = mux.label(index) else {
            return Ok(());
        };
        let chars = &SINGLE;
        let (x, y, w, h) = (pane.x, pane.y, pane.width, pane.height);
        if w < 2 || h < 2 {
            return Ok(());
        }

        queue!(out, SetAttribute(Attribute::Reset), SetForegroundColor(self.border_color(label.tone)))?;

        let (title, title_width) = fit(&label.text, (w as usize).saturating_sub(4));
        let remaining = w as usize - 2 - title_width;
        let left_pad = remaining / 2;
        let right_pad = remaining - left_pad;

        queue!(out, MoveTo(x, y))?;
        let mut top = String::with_capacity(w as usize * 3);
        top.push(chars.top_left);
        top.extend(std::iter::repeat(chars.horizontal).take(left_pad));
        top.push_str(&title);
        top.extend(std::iter::repeat(chars.horizontal).take(right_pad));
        top.push(chars.top_right);
        write!(out, "{}", top)?;

        for row in 1..h - 1 {
            queue!(out, MoveTo(x, y + row))?;
            write!(out, "{}", chars.vertical)?;
            queue!(out, MoveTo(x + w - 1, y + row))?;
            write!(out, "{}", chars.vertical)?;
        }

        queue!(out, MoveTo(x, y + h - 1))?;
        let mut bottom = String::with_capacity(w as usize * 3);
        bottom.push(chars.bottom_left);
        bottom.extend(std::iter::repeat(chars.horizontal).take(w as usize - 2));
        bottom.push(chars.bottom_right);
        write!(out, "{}", bottom)?;

        queue!(out, ResetColor)
    }

    fn apply_style<W: Write>(&self, out: &mut W, style: &CellStyle) -> io::Result<()> {
        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        if let Some(fg) = to_crossterm(style.fg) {
            queue!(out, SetForegroundColor(fg))?;
        }
        if let Some(bg) = to_crossterm(style.bg) {
            queue!(out, SetBackgroundColor(bg))?;
        }
        if style.bold {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if style.italic {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        if style.underline {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        if style.inverse {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        Ok(())
    }

    /// Pane contents, padded to the inner area
    fn draw_cells<W: Write>(&self, out: &mut W, mux: &Multiplexer, index: usize) -> io::Result<()> {
        let pane = &mux.panes[index];
        let screen = pane.session.screen();
        let (inner_x, inner_y) = pane.inner_pos();
        let (inner_w, inner_h) = pane.inner_size();
        let mut line = String::with_capacity(256);

        for row in 0..inner_h {
            queue!(out, MoveTo(inner_x, inner_y + row))?;
            let mut current: Option<CellStyle> = None;
            let mut width: u16 = 0;

            for col in 0..inner_w {
                let Some(cell) = screen.cell(row, col) else {
                    break;
                };
                if cell.is_wide_continuation() {
                    continue;
                }
                let cell_width = if cell.is_wide() { 2 } else { 1 };
                if width + cell_width > inner_w {
                    break;
                }

                let style = CellStyle::of(cell);
                if current != Some(style) {
                    if !line.is_empty() {
                        write!(out, "{}", line)?;
                        line.clear();
                    }
                    self.apply_style(out, &style)?;
                    current = Some(style);
                }

                let text: &str = &cell.contents();
                if text.is_empty() {
                    line.push(' ');
                } else {
                    line.push_str(text);
                }
                width += cell_width;
            }

            if !line.is_empty() {
                write!(out, "{}", line)?;
                line.clear();
            }
            if width < inner_w {
                queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
                write!(out, "{:pad$}", "", pad = (inner_w - width) as usize)?;
            }
        }

        queue!(out, ResetColor, SetAttribute(Attribute::Reset))
    }

    fn draw_menu<W: Write>(&self, out: &mut W, mux: &Multiplexer) -> io::Result<()> {
        let menu = &mux.menu;
        match menu.level {
            MenuLevel::Panes => {
                let rows: Vec<String> = mux
                    .panes
                    .iter()
                    .map(|p| format!("[{}] {}", p.ordinal, p.base_title()))
                    .collect();
                self.draw_box(out, mux, " Panes ", &rows, Some(menu.pane))
            }
            MenuLevel::Actions => {
                let title = mux
                    .panes
                    .get(menu.pane)
                    .map(|p| format!(" {} ", p.base_title()))
                    .unwrap_or_default();
                let rows: Vec<String> = MenuAction::ALL.iter().map(|a| a.label().to_string()).collect();
                self.draw_box(out, mux, &title, &rows, Some(menu.action))
            }
        }
    }

    /// Centered overlay box with an optional highlighted row
    fn draw_box<W: Write>(
        &self,
        out: &mut W,
        mux: &Multiplexer,
        title: &str,
        rows: &[String],
        selected: Option<usize>,
    ) -> io::Result<()> {
        let cs = &self.color_scheme;
        let chars = &SINGLE;
        let bg = cs.overlay_bg.to_crossterm();
        let fg = cs.overlay_fg.to_crossterm();

        let widest = rows
            .iter()
            .map(|r| r.chars().map(|c| c.width().unwrap_or(0)).sum::<usize>())
            .max()
            .unwrap_or(0);
        let inner = (widest + 4)
            .max(title.chars().count() + 2)
            .max(16)
            .min((mux.width as usize).saturating_sub(2));
        if inner == 0 || mux.height < 3 {
            return Ok(());
        }
        let visible = rows.len().min(mux.height as usize - 2);
        let x = ((mux.width as usize).saturating_sub(inner + 2) / 2) as u16;
        let y = ((mux.height as usize).saturating_sub(visible + 2) / 2) as u16;

        // ┌ Title ──────┐
        queue!(out, MoveTo(x, y), SetBackgroundColor(bg), SetForegroundColor(cs.overlay_border.to_crossterm()))?;
        let (title, title_width) = fit(title, inner.saturating_sub(1));
        let mut top = String::new();
        top.push(chars.top_left);
        top.push_str(&title);
        top.extend(std::iter::repeat(chars.horizontal).take(inner - title_width));
        top.push(chars.top_right);
        write!(out, "{}", top)?;

        for (i, row) in rows.iter().take(visible).enumerate() {
            let screen_row = y + 1 + i as u16;
            queue!(out, MoveTo(x, screen_row), SetBackgroundColor(bg), SetForegroundColor(cs.overlay_border.to_crossterm()))?;
            write!(out, "{}", chars.vertical)?;

            let highlighted = selected == Some(i);
            if highlighted {
                queue!(
                    out,
                    SetBackgroundColor(cs.overlay_selected_bg.to_crossterm()),
                    SetForegroundColor(cs.overlay_selected_fg.to_crossterm())
                )?;
            } else {
                queue!(out, SetBackgroundColor(bg), SetForegroundColor(fg))?;
            }
            let marker = if highlighted { "> " } else { "  " };
            let (text, text_width) = fit(row, inner.saturating_sub(3));
            write!(out, " {}{}{:pad$}", marker, text, "", pad = inner.saturating_sub(3 + text_width))?;

            queue!(out, SetBackgroundColor(bg), SetForegroundColor(cs.overlay_border.to_crossterm()))?;
            write!(out, "{}", chars.vertical)?;
        }

        // └─────────────┘
        queue!(out, MoveTo(x, y + 1 + visible as u16))?;
        let mut bottom = String::new();
        bottom.push(chars.bottom_left);
        bottom.extend(std::iter::repeat(chars.horizontal).take(inner));
        bottom.push(chars.bottom_right);
        write!(out, "{}", bottom)?;

        queue!(out, ResetColor)
    }

    /// Where the host cursor belongs, if it should be visible
    fn cursor_position(&self, mux: &Multiplexer) -> Option<(u16, u16)> {
        if mux.input != InputState::Idle || mux.menu.visible || mux.help_visible {
            return None;
        }
        let pane = mux.focused_pane()?;
        let screen = pane.session.screen();
        if pane.is_scrolling() || !pane.session.has_process() || screen.hide_cursor() {
            return None;
        }
        let (row, col) = screen.cursor_position();
        let (inner_x, inner_y) = pane.inner_pos();
        let (inner_w, inner_h) = pane.inner_size();
        Some((inner_x + col.min(inner_w - 1), inner_y + row.min(inner_h - 1)))
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::core::pty::PaneEvent;
    use crate::core::testing::{FakeSpawner, Journal};
    use crate::ui::menu::MenuEvent;
    use crate::wm::tree::{CommandSpec, Orientation, TreeBuilder};
    use std::time::Instant;

    fn mux() -> (Multiplexer, Journal) {
        let mut b = TreeBuilder::new();
        let children = vec![
            b.command(CommandSpec::new("left")),
            b.command(CommandSpec {
                title: Some("logs".into()),
                ..CommandSpec::new("tail -f x")
            }),
        ];
        let tree = b.split(Orientation::Horizontal, children);
        let journal = Journal::default();
        let mut m = Multiplexer::new(
            tree,
            Options::default(),
            Box::new(FakeSpawner::new(journal.clone())),
            40,
            10,
            Instant::now(),
        );
        m.start().unwrap();
        (m, journal)
    }

    fn frame(m: &Multiplexer) -> String {
        let renderer = Renderer::new(ColorScheme::default(), CursorStyle::Block);
        let mut out = Vec::new();
        renderer.draw(&mut out, m, true).unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn test_frame_has_labels_and_contents() {
        let (mut m, journal) = mux();
        let process = journal.last_process(0).unwrap();
        m.handle_pane_event(
            PaneEvent::Output {
                pane: 0,
                process,
                data: b"hello".to_vec(),
            },
            Instant::now(),
        );
        let text = frame(&m);
        assert!(text.starts_with("\x1b[?2026h"));
        assert!(text.ends_with("\x1b[?2026l"));
        assert!(text.contains("( left )"));
        assert!(text.contains("( logs )"));
        assert!(text.contains("hello"));
    }

    #[test]
    fn test_menu_overlay() {
        let (mut m, _journal) = mux();
        m.dispatch_menu(MenuEvent::Show);
        let text = frame(&m);
        assert!(text.contains(" Panes "));
        assert!(text.contains("> [1] left"));
        assert!(text.contains("[2] logs"));

        m.dispatch_menu(MenuEvent::Enter);
        let text = frame(&m);
        assert!(text.contains(" left "));
        assert!(text.contains("> Start"));
        assert!(text.contains("Visual"));
    }

    #[test]
    fn test_help_overlay() {
        let (mut m, _journal) = mux();
        m.help_visible = true;
        assert!(frame(&m).contains("Ctrl+A enters prefix mode"));
    }

    #[test]
    fn test_cursor_follows_focused_pane() {
        let (m, _journal) = mux();
        let renderer = Renderer::new(ColorScheme::default(), CursorStyle::Block);
        assert_eq!(renderer.cursor_position(&m), Some((1, 1)));
    }

    #[test]
    fn test_fit_respects_wide_chars() {
        assert_eq!(fit("abc", 2), ("ab".to_string(), 2));
        assert_eq!(fit("日本", 3), ("日".to_string(), 2));
    }
}
