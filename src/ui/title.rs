//! Pane labels drawn into the top border

use crate::wm::pane::{Pane, PaneFlags, PaneMode};

/// Color of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Focused,
    Error,
    Scrolling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneLabel {
    pub text: String,
    pub tone: Tone,
}

/// Global state a label depends on
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleContext {
    pub number: bool,
    pub focused: bool,
    pub zoomed: bool,
}

/// Build the label of a pane
pub fn render(pane: &Pane, ctx: &TitleContext) -> PaneLabel {
    let mut text = match pane.countdown {
        Some(count) => format!("( {} {} )", pane.base_title(), count),
        None => format!("( {} )", pane.base_title()),
    };
    if ctx.number {
        text = format!("[{}]-{}", pane.ordinal, text);
    }
    if ctx.zoomed {
        text.push_str("-[ZOOMED]");
    }
    if pane.flags.contains(PaneFlags::ERROR) {
        text.push_str("-[ERROR]");
    }
    if pane.flags.contains(PaneFlags::MOUSE) {
        text.push_str("-[MOUSE]");
    }
    match pane.mode {
        PaneMode::Normal => {}
        PaneMode::PrefixArmed => text.push_str("-[PREF]"),
        PaneMode::PrefixActive => text.push_str("-[ACT]"),
        PaneMode::Menu => text.push_str("-[MENU]"),
    }

    let tone = if pane.is_scrolling() {
        Tone::Scrolling
    } else if pane.flags.contains(PaneFlags::ERROR) {
        Tone::Error
    } else if ctx.focused {
        Tone::Focused
    } else {
        Tone::Plain
    };

    PaneLabel { text, tone }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::tree::CommandSpec;

    fn pane() -> Pane {
        Pane::new(3, vec![CommandSpec::new("cargo watch")])
    }

    #[test]
    fn test_plain_label() {
        let label = render(&pane(), &TitleContext::default());
        assert_eq!(label.text, "( cargo watch )");
        assert_eq!(label.tone, Tone::Plain);
    }

    #[test]
    fn test_badges_in_order() {
        let mut p = pane();
        p.countdown = Some(2);
        p.flags = PaneFlags::ERROR | PaneFlags::MOUSE;
        p.mode = PaneMode::PrefixActive;
        let ctx = TitleContext {
            number: true,
            focused: true,
            zoomed: true,
        };
        let label = render(&p, &ctx);
        assert_eq!(label.text, "[3]-( cargo watch 2 )-[ZOOMED]-[ERROR]-[MOUSE]-[ACT]");
        assert_eq!(label.tone, Tone::Error);
    }

    #[test]
    fn test_tone_precedence() {
        let focused = TitleContext {
            focused: true,
            ..TitleContext::default()
        };
        let mut p = pane();
        assert_eq!(render(&p, &focused).tone, Tone::Focused);

        p.flags.insert(PaneFlags::ERROR);
        assert_eq!(render(&p, &focused).tone, Tone::Error);

        p.flags.insert(PaneFlags::SCROLLING);
        assert_eq!(render(&p, &focused).tone, Tone::Scrolling);
    }

    #[test]
    fn test_mode_badges() {
        let mut p = pane();
        p.mode = PaneMode::PrefixArmed;
        assert!(render(&p, &TitleContext::default()).text.ends_with("-[PREF]"));
        p.mode = PaneMode::Menu;
        assert!(render(&p, &TitleContext::default()).text.ends_with("-[MENU]"));
    }

    #[test]
    fn test_render_is_idempotent() {
        let p = pane();
        let ctx = TitleContext {
            number: true,
            ..TitleContext::default()
        };
        assert_eq!(render(&p, &ctx), render(&p, &ctx));
    }
}
