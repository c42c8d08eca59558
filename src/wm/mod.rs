//! Window Manager - pane tree, geometry and focus.
//!
//! # Module Hierarchy
//!
//! ```text
//! wm/
//! ├── mod.rs      - Module exports
//! ├── tree.rs     - Node (immutable pane tree)
//! ├── divider.rs  - 1-D segment allocation
//! ├── manager.rs  - Multiplexer (application state)
//! ├── layout.rs   - Provisioning of panes from the tree
//! ├── focus.rs    - Directional and sequential focus
//! └── pane.rs     - Pane (geometry + session)
//! ```

pub mod divider;
pub mod focus;
pub mod layout;
pub mod manager;
pub mod pane;
pub mod tree;
