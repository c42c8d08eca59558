//! Core process and terminal components.
//!
//! - **pty**: spawner/process traits and the `portable-pty` backend
//! - **session**: one pane's screen model, scroll state and process handle
//! - **timer**: timer queue and deferred-task queue
//! - **lifecycle**: spawn, exit, restart and shutdown policy
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Process (pty I/O with the child)
//! └── vt100::Parser
//!     ├── Screen (cell grid + attributes)
//!     └── Scrollback
//! ```

pub mod lifecycle;
pub mod pty;
pub mod session;
pub mod timer;

#[cfg(test)]
pub mod testing;
