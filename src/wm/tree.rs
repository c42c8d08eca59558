//! Tree - The declarative pane tree
//!
//! The tree is built once at startup, either from a TOML layout file or from
//! the commands given on the command line, and is never mutated afterwards.
//! Panes refer back to the node they were provisioned from by `NodeId`.
//!
//! ```toml
//! [layout]
//! split = "horizontal"
//!
//! [[layout.children]]
//! cmd = "htop"
//! size = "30%"
//!
//! [[layout.children]]
//! group = [{ cmd = "make" }, { cmd = "make test", cwd = "tests" }]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Identity of a node within its tree
pub type NodeId = usize;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("failed to read layout file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("a group needs at least one command")]
    EmptyGroup,

    #[error("a split needs at least one child")]
    EmptySplit,

    #[error("no commands given")]
    NoCommands,
}

/// Split orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Children side by side, dividing the width
    Horizontal,
    /// Children stacked, dividing the height
    Vertical,
}

/// Attributes of a single command node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSpec {
    /// Shell command line
    pub cmd: String,
    /// Working directory (host cwd when unset)
    pub cwd: Option<PathBuf>,
    /// Startup delay in milliseconds
    pub wait: u64,
    /// Respawn the command after it terminates
    pub restart: bool,
    /// Delay before a respawn, in milliseconds
    pub delay: u64,
    /// Request initial focus
    pub focus: bool,
    /// Enable mouse handling for this pane
    pub mouse: bool,
    /// Display title (falls back to the command)
    pub title: Option<String>,
}

impl CommandSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            ..Self::default()
        }
    }

    /// Title shown in the pane label and the menu
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.cmd)
    }
}

/// A node of the pane tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Size spec used by the parent split
    pub size: Option<String>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Split {
        orientation: Orientation,
        children: Vec<Node>,
    },
    Group {
        primary: Box<Node>,
        fallbacks: Vec<Node>,
    },
    Command(CommandSpec),
}

impl Node {
    /// Variant name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Split { .. } => "split",
            NodeKind::Group { .. } => "group",
            NodeKind::Command(_) => "command",
        }
    }

    pub fn as_command(&self) -> Option<&CommandSpec> {
        match &self.kind {
            NodeKind::Command(spec) => Some(spec),
            _ => None,
        }
    }

    /// Load a tree from a TOML layout file
    pub fn load(path: &Path) -> Result<Node, TreeError> {
        let content = fs::read_to_string(path).map_err(|source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a tree from TOML text with a top-level `[layout]` table
    pub fn from_toml_str(content: &str) -> Result<Node, TreeError> {
        let file: LayoutFile = toml::from_str(content)?;
        TreeBuilder::new().build(file.layout)
    }

    /// Build a tree from plain command lines: one pane, or one split of panes
    pub fn from_commands(commands: &[String], orientation: Orientation) -> Result<Node, TreeError> {
        let mut builder = TreeBuilder::new();
        match commands {
            [] => Err(TreeError::NoCommands),
            [single] => Ok(builder.command(CommandSpec::new(single.clone()))),
            many => {
                let children = many
                    .iter()
                    .map(|cmd| builder.command(CommandSpec::new(cmd.clone())))
                    .collect();
                Ok(builder.split(orientation, children))
            }
        }
    }
}

/// Hands out node ids while a tree is assembled
#[derive(Debug, Default)]
pub struct TreeBuilder {
    next_id: NodeId,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, kind: NodeKind) -> Node {
        let id = self.next_id;
        self.next_id += 1;
        Node { id, size: None, kind }
    }

    pub fn command(&mut self, spec: CommandSpec) -> Node {
        self.node(NodeKind::Command(spec))
    }

    pub fn group(&mut self, primary: Node, fallbacks: Vec<Node>) -> Node {
        self.node(NodeKind::Group {
            primary: Box::new(primary),
            fallbacks,
        })
    }

    pub fn split(&mut self, orientation: Orientation, children: Vec<Node>) -> Node {
        self.node(NodeKind::Split { orientation, children })
    }

    fn build(&mut self, spec: NodeSpec) -> Result<Node, TreeError> {
        let (mut node, size) = match spec {
            NodeSpec::Split { split, children, size } => {
                if children.is_empty() {
                    return Err(TreeError::EmptySplit);
                }
                let children = children
                    .into_iter()
                    .map(|child| self.build(child))
                    .collect::<Result<Vec<_>, _>>()?;
                (self.split(split, children), size)
            }
            NodeSpec::Group { group, size } => {
                let mut members = group
                    .into_iter()
                    .map(|member| self.build(member))
                    .collect::<Result<Vec<_>, _>>()?;
                if members.is_empty() {
                    return Err(TreeError::EmptyGroup);
                }
                let primary = members.remove(0);
                (self.group(primary, members), size)
            }
            NodeSpec::Command {
                cmd,
                cwd,
                wait,
                restart,
                delay,
                focus,
                mouse,
                title,
                size,
            } => {
                let spec = CommandSpec {
                    cmd,
                    cwd,
                    wait,
                    restart,
                    delay,
                    focus,
                    mouse,
                    title,
                };
                (self.command(spec), size)
            }
        };
        node.size = size.map(SizeValue::into_spec);
        Ok(node)
    }
}

#[derive(Deserialize)]
struct LayoutFile {
    layout: NodeSpec,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeSpec {
    Split {
        split: Orientation,
        children: Vec<NodeSpec>,
        #[serde(default)]
        size: Option<SizeValue>,
    },
    Group {
        group: Vec<NodeSpec>,
        #[serde(default)]
        size: Option<SizeValue>,
    },
    Command {
        cmd: String,
        #[serde(default)]
        cwd: Option<PathBuf>,
        #[serde(default)]
        wait: u64,
        #[serde(default)]
        restart: bool,
        #[serde(default)]
        delay: u64,
        #[serde(default)]
        focus: bool,
        #[serde(default)]
        mouse: bool,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        size: Option<SizeValue>,
    },
}

/// Sizes may be written as strings or bare numbers in TOML
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Cells(u64),
    Fraction(f64),
    Text(String),
}

impl SizeValue {
    fn into_spec(self) -> String {
        match self {
            SizeValue::Cells(n) => n.to_string(),
            SizeValue::Fraction(f) => format!("{}", f),
            SizeValue::Text(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_layout() {
        let tree = Node::from_toml_str(
            r#"
            [layout]
            split = "horizontal"

            [[layout.children]]
            cmd = "htop"
            size = "30%"
            focus = true

            [[layout.children]]
            split = "vertical"
            size = 40
            children = [
                { cmd = "tail -f log", title = "log" },
                { group = [{ cmd = "make" }, { cmd = "make test", cwd = "/tmp" }] },
            ]
            "#,
        )
        .unwrap();

        let NodeKind::Split { orientation, children } = &tree.kind else {
            panic!("expected split, got {}", tree.kind_name());
        };
        assert_eq!(*orientation, Orientation::Horizontal);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].size.as_deref(), Some("30%"));
        assert!(children[0].as_command().unwrap().focus);
        assert_eq!(children[1].size.as_deref(), Some("40"));

        let NodeKind::Split { children: inner, .. } = &children[1].kind else {
            panic!("expected inner split");
        };
        assert_eq!(inner[0].as_command().unwrap().display_title(), "log");
        let NodeKind::Group { primary, fallbacks } = &inner[1].kind else {
            panic!("expected group");
        };
        assert_eq!(primary.as_command().unwrap().cmd, "make");
        assert_eq!(fallbacks[0].as_command().unwrap().cwd.as_deref(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_node_ids_are_unique() {
        let tree = Node::from_commands(
            &["a".to_string(), "b".to_string(), "c".to_string()],
            Orientation::Vertical,
        )
        .unwrap();
        let NodeKind::Split { children, .. } = &tree.kind else {
            panic!("expected split");
        };
        let mut ids: Vec<NodeId> = children.iter().map(|c| c.id).collect();
        ids.push(tree.id);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_single_command_is_a_leaf() {
        let tree = Node::from_commands(&["bash".to_string()], Orientation::Horizontal).unwrap();
        assert_eq!(tree.as_command().map(|c| c.cmd.as_str()), Some("bash"));
    }

    #[test]
    fn test_rejects_empty_group_and_split() {
        assert!(matches!(
            Node::from_toml_str("[layout]\ngroup = []\n"),
            Err(TreeError::EmptyGroup)
        ));
        assert!(matches!(
            Node::from_toml_str("[layout]\nsplit = \"vertical\"\nchildren = []\n"),
            Err(TreeError::EmptySplit)
        ));
        assert!(matches!(Node::from_commands(&[], Orientation::Vertical), Err(TreeError::NoCommands)));
    }

    #[test]
    fn test_fractional_size() {
        let tree = Node::from_toml_str(
            "[layout]\nsplit = \"vertical\"\nchildren = [{ cmd = \"a\", size = 0.25 }, { cmd = \"b\" }]\n",
        )
        .unwrap();
        let NodeKind::Split { children, .. } = &tree.kind else {
            panic!("expected split");
        };
        assert_eq!(children[0].size.as_deref(), Some("0.25"));
    }
}
