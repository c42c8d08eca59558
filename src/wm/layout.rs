//! Layout - Turns the pane tree into pane geometry
//!
//! Provisioning walks the tree over a rectangle. Splits hand their long axis
//! to the divider and recurse; commands and groups land on a pane. Panes are
//! created on first sight and keyed by node, so a later walk only moves and
//! resizes them and never touches their processes.

use std::rc::Rc;

use thiserror::Error;

use super::divider::divide;
use super::manager::Multiplexer;
use super::pane::{Pane, PaneFlags};
use super::tree::{CommandSpec, Node, NodeKind, Orientation};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("terminal too small")]
    TooSmall,

    #[error("invalid node (expected {expected}, found {found})")]
    InvalidNode {
        expected: &'static str,
        found: &'static str,
    },

    #[error("only a single command can be focused")]
    MultipleFocus,
}

/// Paint order of a pane drawn over the others
const ZOOMED_PAINT_ORDER: u8 = 2;

impl Multiplexer {
    /// First walk: creates every pane, starts its command and picks the
    /// initially focused pane.
    pub fn provision_initially(&mut self) -> Result<(), LayoutError> {
        self.focus_request = None;
        self.walk(true)?;
        let focus = self.focus_request.unwrap_or(0);
        if focus < self.panes.len() {
            self.focused = Some(focus);
        }
        tracing::info!(
            "provisioned {} panes on {}x{}, focus on pane {}",
            self.panes.len(),
            self.width,
            self.height,
            focus + 1
        );
        Ok(())
    }

    /// Re-layout over the current screen size
    pub fn provision_again(&mut self) -> Result<(), LayoutError> {
        self.walk(false)
    }

    fn walk(&mut self, initially: bool) -> Result<(), LayoutError> {
        let tree = Rc::clone(&self.tree);
        let (w, h) = (self.width, self.height);
        self.provision(0, 0, w, h, &tree, initially)?;
        self.request_repaint();
        Ok(())
    }

    fn provision(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        node: &Node,
        initially: bool,
    ) -> Result<(), LayoutError> {
        match &node.kind {
            NodeKind::Command(_) => self.provision_command(x, y, w, h, node, &[], initially),
            NodeKind::Group { .. } => self.provision_group(x, y, w, h, node, initially),
            NodeKind::Split { .. } => self.provision_split(x, y, w, h, node, initially),
        }
    }

    fn provision_split(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        node: &Node,
        initially: bool,
    ) -> Result<(), LayoutError> {
        let NodeKind::Split { orientation, children } = &node.kind else {
            return Err(LayoutError::InvalidNode {
                expected: "split",
                found: node.kind_name(),
            });
        };

        let sizes: Vec<Option<&str>> = children.iter().map(|c| c.size.as_deref()).collect();
        match orientation {
            Orientation::Horizontal => {
                for (child, seg) in children.iter().zip(divide(x, w, &sizes)?) {
                    self.provision(seg.start, y, seg.len, h, child, initially)?;
                }
            }
            Orientation::Vertical => {
                for (child, seg) in children.iter().zip(divide(y, h, &sizes)?) {
                    self.provision(x, seg.start, w, seg.len, child, initially)?;
                }
            }
        }
        Ok(())
    }

    fn provision_group(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        node: &Node,
        initially: bool,
    ) -> Result<(), LayoutError> {
        let NodeKind::Group { primary, fallbacks } = &node.kind else {
            return Err(LayoutError::InvalidNode {
                expected: "group",
                found: node.kind_name(),
            });
        };
        self.provision_command(x, y, w, h, primary, fallbacks, initially)
    }

    #[allow(clippy::too_many_arguments)]
    fn provision_command(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        node: &Node,
        fallbacks: &[Node],
        initially: bool,
    ) -> Result<(), LayoutError> {
        let spec = node.as_command().ok_or(LayoutError::InvalidNode {
            expected: "command",
            found: node.kind_name(),
        })?;

        let index = match self.by_node.get(&node.id) {
            Some(&index) => index,
            None => {
                let mut chain = vec![spec.clone()];
                for fallback in fallbacks {
                    let fallback_spec = fallback.as_command().ok_or(LayoutError::InvalidNode {
                        expected: "command",
                        found: fallback.kind_name(),
                    })?;
                    chain.push(fallback_spec.clone());
                }
                let index = self.panes.len();
                self.panes.push(Pane::new(index + 1, chain));
                self.by_node.insert(node.id, index);
                index
            }
        };

        if self.zoomed == Some(index) {
            let (sw, sh) = (self.width, self.height);
            let pane = &mut self.panes[index];
            pane.place(0, 0, sw, sh);
            pane.paint_order = ZOOMED_PAINT_ORDER;
        } else {
            let pane = &mut self.panes[index];
            pane.place(x, y, w, h);
            pane.paint_order = 1;
        }

        if initially {
            self.setup_pane(index, spec)?;
        }
        Ok(())
    }

    /// One-time setup of a freshly created pane
    fn setup_pane(&mut self, index: usize, spec: &CommandSpec) -> Result<(), LayoutError> {
        if self.options.mouse || spec.mouse {
            self.panes[index].flags.insert(PaneFlags::MOUSE);
        }
        if spec.focus {
            if self.focus_request.is_some() {
                return Err(LayoutError::MultipleFocus);
            }
            self.focus_request = Some(index);
        }
        self.start_pane(index);
        Ok(())
    }
}
