//! Configuration for splitmux.
//!
//! Settings are resolved from the defaults, then `~/.splitmux/config.toml`,
//! then the command line (applied in `main`).
//!
//! # Configuration File
//!
//! ```toml
//! # Prefix key, used as Ctrl+<activator>
//! activator = "a"
//!
//! # Pass mouse events to panes
//! mouse = true
//!
//! # Show pane numbers in the labels
//! number = false
//!
//! # Cursor shape: block, underline, bar
//! cursor = "bar"
//!
//! # When to exit once every pane has terminated:
//! # "" exits, "error" exits unless a pane failed, anything else stays
//! wait = "error"
//!
//! # Color scheme: default, nord, gruvbox-dark, tokyo-night
//! color_scheme = "nord"
//! ```

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

/// What to do once every pane has terminated
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum WaitPolicy {
    /// Exit
    #[default]
    Exit,
    /// Exit unless some pane exited with an error
    ExitUnlessError,
    /// Never exit on its own; holds the policy text as given
    Stay(String),
}

impl WaitPolicy {
    pub fn parse(text: &str) -> Self {
        match text {
            "" => WaitPolicy::Exit,
            "error" => WaitPolicy::ExitUnlessError,
            other => WaitPolicy::Stay(other.to_string()),
        }
    }
}

impl From<String> for WaitPolicy {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

/// Cursor shape requested for the host terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    #[default]
    Block,
    Underline,
    Bar,
}

impl FromStr for CursorStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(CursorStyle::Block),
            "underline" => Ok(CursorStyle::Underline),
            "bar" => Ok(CursorStyle::Bar),
            other => Err(format!("unknown cursor style '{}'", other)),
        }
    }
}

impl fmt::Display for CursorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CursorStyle::Block => "block",
            CursorStyle::Underline => "underline",
            CursorStyle::Bar => "bar",
        };
        f.write_str(name)
    }
}

/// Runtime options bag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Prefix key letter
    pub activator: char,
    /// Mouse enabled for every pane
    pub mouse: bool,
    /// Pane numbering in labels
    pub number: bool,
    pub cursor: CursorStyle,
    pub wait: WaitPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            activator: 'a',
            mouse: false,
            number: false,
            cursor: CursorStyle::Block,
            wait: WaitPolicy::Exit,
        }
    }
}

/// Contents of the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub activator: char,
    pub mouse: bool,
    pub number: bool,
    pub cursor: CursorStyle,
    pub wait: WaitPolicy,
    /// Color scheme name
    pub color_scheme: String,
}

impl Default for Config {
    fn default() -> Self {
        let options = Options::default();
        Self {
            activator: options.activator,
            mouse: options.mouse,
            number: options.number,
            cursor: options.cursor,
            wait: options.wait,
            color_scheme: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to the defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path).map(|content| Self::from_toml_str(&content)) {
            Ok(Ok(config)) => config,
            Ok(Err(e)) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `~/.splitmux/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join("config.toml"))
    }

    /// Options before command-line overrides
    pub fn options(&self) -> Options {
        Options {
            activator: self.activator,
            mouse: self.mouse,
            number: self.number,
            cursor: self.cursor,
            wait: self.wait.clone(),
        }
    }

    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Colors used by the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: &'static str,

    // Pane borders, by label tone
    pub border: Color,
    pub border_focused: Color,
    pub border_error: Color,
    pub border_scrolling: Color,

    // Menu and help overlays
    pub overlay_bg: Color,
    pub overlay_fg: Color,
    pub overlay_selected_bg: Color,
    pub overlay_selected_fg: Color,
    pub overlay_border: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_scheme()
    }
}

impl ColorScheme {
    pub fn default_scheme() -> Self {
        Self {
            name: "default",
            border: Color::new(128, 128, 128),
            border_focused: Color::new(0, 205, 0),
            border_error: Color::new(205, 0, 0),
            border_scrolling: Color::new(205, 205, 0),
            overlay_bg: Color::new(0, 0, 139),
            overlay_fg: Color::new(255, 255, 255),
            overlay_selected_bg: Color::new(255, 255, 255),
            overlay_selected_fg: Color::new(0, 0, 0),
            overlay_border: Color::new(100, 100, 255),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord",
            border: Color::new(76, 86, 106),
            border_focused: Color::new(163, 190, 140),
            border_error: Color::new(191, 97, 106),
            border_scrolling: Color::new(235, 203, 139),
            overlay_bg: Color::new(46, 52, 64),
            overlay_fg: Color::new(216, 222, 233),
            overlay_selected_bg: Color::new(136, 192, 208),
            overlay_selected_fg: Color::new(46, 52, 64),
            overlay_border: Color::new(136, 192, 208),
        }
    }

    pub fn gruvbox_dark() -> Self {
        Self {
            name: "gruvbox-dark",
            border: Color::new(102, 92, 84),
            border_focused: Color::new(184, 187, 38),
            border_error: Color::new(251, 73, 52),
            border_scrolling: Color::new(250, 189, 47),
            overlay_bg: Color::new(40, 40, 40),
            overlay_fg: Color::new(235, 219, 178),
            overlay_selected_bg: Color::new(215, 153, 33),
            overlay_selected_fg: Color::new(40, 40, 40),
            overlay_border: Color::new(215, 153, 33),
        }
    }

    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night",
            border: Color::new(86, 95, 137),
            border_focused: Color::new(158, 206, 106),
            border_error: Color::new(247, 118, 142),
            border_scrolling: Color::new(224, 175, 104),
            overlay_bg: Color::new(26, 27, 38),
            overlay_fg: Color::new(192, 202, 245),
            overlay_selected_bg: Color::new(122, 162, 247),
            overlay_selected_fg: Color::new(26, 27, 38),
            overlay_border: Color::new(122, 162, 247),
        }
    }

    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "nord" => Self::nord(),
            "gruvbox-dark" | "gruvbox_dark" | "gruvbox" => Self::gruvbox_dark(),
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            _ => Self::default_scheme(),
        }
    }
}

/// `~/.splitmux`, created on first use
pub fn data_dir() -> Option<PathBuf> {
    let dir = home_dir()?.join(".splitmux");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_policy_parse() {
        assert_eq!(WaitPolicy::parse(""), WaitPolicy::Exit);
        assert_eq!(WaitPolicy::parse("error"), WaitPolicy::ExitUnlessError);
        assert_eq!(WaitPolicy::parse("always"), WaitPolicy::Stay("always".into()));
    }

    #[test]
    fn test_config_file() {
        let config = Config::from_toml_str(
            r#"
            activator = "b"
            mouse = true
            cursor = "underline"
            wait = "error"
            color_scheme = "nord"
            "#,
        )
        .unwrap();
        let options = config.options();
        assert_eq!(options.activator, 'b');
        assert!(options.mouse);
        assert!(!options.number);
        assert_eq!(options.cursor, CursorStyle::Underline);
        assert_eq!(options.wait, WaitPolicy::ExitUnlessError);
        assert_eq!(config.color_scheme().name, "nord");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.options(), Options::default());
        assert_eq!(config.color_scheme(), ColorScheme::default_scheme());
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(Config::from_toml_str("cursor = \"beam\"").is_err());
        assert!(Config::from_toml_str("activator = \"ab\"").is_err());
    }

    #[test]
    fn test_cursor_style_from_str() {
        assert_eq!("BAR".parse::<CursorStyle>(), Ok(CursorStyle::Bar));
        assert!("beam".parse::<CursorStyle>().is_err());
        assert_eq!(CursorStyle::Underline.to_string(), "underline");
    }

    #[test]
    fn test_unknown_scheme_falls_back() {
        assert_eq!(ColorScheme::by_name("nope").name, "default");
        assert_eq!(ColorScheme::by_name("Tokyo-Night").name, "tokyo-night");
    }
}
