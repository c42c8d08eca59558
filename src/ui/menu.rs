//! Menu overlay for pane operations.
//!
//! Two lists share the overlay: first the panes, then the actions for the
//! chosen pane. Selection is bounded, it never wraps.
//!
//! ```text
//! ┌ Panes ───────┐      ┌ Panes ───────┐
//! │ > htop       │      │ make test    │
//! │   make test  │ ───▶ ├──────────────┤
//! │   tail -f    │      │ > Start      │
//! └──────────────┘      │   Stop       │
//!                       │   ...        │
//! ```

/// Events driving the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    Show,
    Hide,
    Up,
    Down,
    Enter,
    Close,
}

/// Actions offered for a pane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Spawn if nothing is running
    Start,
    /// Hard-terminate
    Stop,
    /// Manual restart
    Restart,
    /// Focus and toggle zoom
    Zoom,
    /// Focus and enter scroll mode
    Visual,
}

impl MenuAction {
    pub const ALL: [MenuAction; 5] = [
        MenuAction::Start,
        MenuAction::Stop,
        MenuAction::Restart,
        MenuAction::Zoom,
        MenuAction::Visual,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Start => "Start",
            MenuAction::Stop => "Stop",
            MenuAction::Restart => "Restart",
            MenuAction::Zoom => "Zoom",
            MenuAction::Visual => "Visual",
        }
    }
}

/// Which list currently has the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuLevel {
    Panes,
    Actions,
}

/// Menu overlay state
pub struct Menu {
    /// Whether the overlay is visible
    pub visible: bool,
    pub level: MenuLevel,
    /// Selected pane index
    pub pane: usize,
    /// Selected action index
    pub action: usize,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self {
            visible: false,
            level: MenuLevel::Panes,
            pane: 0,
            action: 0,
        }
    }

    /// Show the pane list with the first entry selected
    pub fn show(&mut self) {
        self.visible = true;
        self.level = MenuLevel::Panes;
        self.pane = 0;
        self.action = 0;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Move selection up
    pub fn up(&mut self) {
        match self.level {
            MenuLevel::Panes => self.pane = self.pane.saturating_sub(1),
            MenuLevel::Actions => self.action = self.action.saturating_sub(1),
        }
    }

    /// Move selection down, staying within `pane_count` entries
    pub fn down(&mut self, pane_count: usize) {
        match self.level {
            MenuLevel::Panes => {
                if self.pane + 1 < pane_count {
                    self.pane += 1;
                }
            }
            MenuLevel::Actions => {
                if self.action + 1 < MenuAction::ALL.len() {
                    self.action += 1;
                }
            }
        }
    }

    /// Confirm the current selection. Returns the committed action once
    /// both a pane and an action have been chosen.
    pub fn enter(&mut self) -> Option<(usize, MenuAction)> {
        match self.level {
            MenuLevel::Panes => {
                self.level = MenuLevel::Actions;
                self.action = 0;
                None
            }
            MenuLevel::Actions => Some((self.pane, MenuAction::ALL[self.action])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_is_bounded() {
        let mut menu = Menu::new();
        menu.show();
        menu.up();
        assert_eq!(menu.pane, 0);
        menu.down(3);
        menu.down(3);
        menu.down(3);
        assert_eq!(menu.pane, 2);
        menu.up();
        assert_eq!(menu.pane, 1);
    }

    #[test]
    fn test_two_level_selection() {
        let mut menu = Menu::new();
        menu.show();
        menu.down(2);
        assert_eq!(menu.enter(), None);
        assert_eq!(menu.level, MenuLevel::Actions);

        for _ in 0..10 {
            menu.down(2);
        }
        assert_eq!(menu.action, MenuAction::ALL.len() - 1);
        menu.up();
        menu.up();
        assert_eq!(menu.enter(), Some((1, MenuAction::Restart)));
    }

    #[test]
    fn test_show_resets_selection() {
        let mut menu = Menu::new();
        menu.show();
        menu.down(4);
        menu.enter();
        menu.down(4);
        menu.hide();
        menu.show();
        assert!(menu.visible);
        assert_eq!((menu.level, menu.pane, menu.action), (MenuLevel::Panes, 0, 0));
    }
}
