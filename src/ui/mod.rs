//! User interface rendering and input handling.
//!
//! - **input**: modal key and mouse state machine
//! - **keymapper**: keyboard and mouse input to pty byte sequences
//! - **menu**: two-level pane/action menu
//! - **title**: pane labels
//! - **renderer**: compositor for borders, pane contents and overlays
//! - **help**: help overlay text

pub mod help;
pub mod input;
pub mod keymapper;
pub mod menu;
pub mod renderer;
pub mod title;
