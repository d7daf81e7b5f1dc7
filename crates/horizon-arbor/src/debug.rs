//! Human-readable dumps of a [`TreeStore`].
//!
//! ```
//! use horizon_arbor::debug::{TreeDebug, TreeFormatOptions};
//! use horizon_arbor::{NodeId, NodePayload, TreeStore};
//!
//! let mut store = TreeStore::new();
//! store.add_node(NodeId::ROOT, NodeId(1), NodePayload::folder("docs")).unwrap();
//! store.add_node(NodeId(1), NodeId(2), NodePayload::leaf("a.txt")).unwrap();
//!
//! let text = TreeDebug::with_options(TreeFormatOptions::minimal()).format(&store);
//! assert_eq!(text, "Tree (2 nodes):\n└── docs/\n    └── a.txt\n");
//! ```

use std::fmt;

use crate::store::{NodeId, TreeStore};

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Indentation only.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show node levels.
    pub show_levels: bool,
    /// Whether to show child and descendant counts.
    pub show_counts: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_levels: false,
            show_counts: false,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_levels: true,
            show_counts: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a node store.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the whole tree below the synthetic root.
    pub fn format(&self, store: &TreeStore) -> String {
        self.display(store, NodeId::ROOT).to_string()
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, store: &TreeStore, root: NodeId) -> String {
        self.display(store, root).to_string()
    }

    /// A [`Display`](fmt::Display) adapter for the subtree rooted at `root`.
    pub fn display<'a>(&'a self, store: &'a TreeStore, root: NodeId) -> impl fmt::Display + 'a {
        Rendered {
            debug: self,
            store,
            root,
        }
    }

    fn glyphs(&self) -> Glyphs {
        match self.options.style {
            TreeStyle::Ascii => Glyphs {
                branch: "|   ",
                tee: "+-- ",
                corner: "`-- ",
                blank: "    ",
            },
            TreeStyle::Unicode => Glyphs {
                branch: "\u{2502}   ",
                tee: "\u{251c}\u{2500}\u{2500} ",
                corner: "\u{2514}\u{2500}\u{2500} ",
                blank: "    ",
            },
            TreeStyle::Compact => Glyphs {
                branch: "  ",
                tee: "- ",
                corner: "- ",
                blank: "  ",
            },
        }
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        store: &TreeStore,
        id: NodeId,
        depth: usize,
        open: &mut Vec<bool>,
    ) -> fmt::Result {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }
        let Some(node) = store.get(id) else {
            return Ok(());
        };

        let glyphs = self.glyphs();
        if let Some((&last, ancestors)) = open.split_last() {
            for &more in ancestors {
                f.write_str(if more { glyphs.branch } else { glyphs.blank })?;
            }
            f.write_str(if last { glyphs.tee } else { glyphs.corner })?;
        }

        let title = &node.payload().title;
        f.write_str(if title.is_empty() { "(untitled)" } else { title })?;
        if node.is_folder() {
            f.write_str("/")?;
        }
        if self.options.show_ids {
            write!(f, " [{}]", node.id())?;
        }
        if self.options.show_levels {
            write!(f, " level={}", node.level())?;
        }
        if self.options.show_counts {
            let info = node.child_info();
            write!(
                f,
                " children={} descendants={}",
                info.child_count, info.total_descendant_count
            )?;
        }
        writeln!(f)?;

        let children = node.children();
        for (i, &child) in children.iter().enumerate() {
            open.push(i + 1 < children.len());
            self.write_node(f, store, child, depth + 1, open)?;
            open.pop();
        }
        Ok(())
    }
}

struct Glyphs {
    branch: &'static str,
    tee: &'static str,
    corner: &'static str,
    blank: &'static str,
}

struct Rendered<'a> {
    debug: &'a TreeDebug,
    store: &'a TreeStore,
    root: NodeId,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut open = Vec::new();
        if !self.root.is_root() {
            return self.debug.write_node(f, self.store, self.root, 0, &mut open);
        }

        let count = self.store.len();
        writeln!(f, "Tree ({count} {}):", if count == 1 { "node" } else { "nodes" })?;
        if count == 0 {
            return writeln!(f, "  (empty)");
        }
        let children = self.store.children(NodeId::ROOT);
        for (i, &child) in children.iter().enumerate() {
            open.push(i + 1 < children.len());
            self.debug.write_node(f, self.store, child, 0, &mut open)?;
            open.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NodePayload;

    fn sample() -> TreeStore {
        let mut store = TreeStore::new();
        store.add_node(NodeId::ROOT, NodeId(1), NodePayload::folder("docs")).unwrap();
        store.add_node(NodeId(1), NodeId(2), NodePayload::leaf("a.txt")).unwrap();
        store.add_node(NodeId(1), NodeId(3), NodePayload::folder("src")).unwrap();
        store.add_node(NodeId(3), NodeId(4), NodePayload::leaf("main.rs")).unwrap();
        store.add_node(NodeId::ROOT, NodeId(5), NodePayload::leaf("notes")).unwrap();
        store
    }

    #[test]
    fn test_unicode_tree() {
        let text = TreeDebug::new().format(&sample());
        let expected = "\
Tree (5 nodes):
├── docs/ [1]
│   ├── a.txt [2]
│   └── src/ [3]
│       └── main.rs [4]
└── notes [5]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_ascii_subtree_with_counts() {
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            show_ids: false,
            show_counts: true,
            ..Default::default()
        };
        let text = TreeDebug::with_options(options).format_subtree(&sample(), NodeId(1));
        let expected = "\
docs/ children=2 descendants=3
+-- a.txt children=0 descendants=0
`-- src/ children=1 descendants=1
    `-- main.rs children=0 descendants=0
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_max_depth_and_empty() {
        let options = TreeFormatOptions {
            style: TreeStyle::Compact,
            max_depth: Some(0),
            ..TreeFormatOptions::minimal()
        };
        let text = TreeDebug::with_options(options).format(&sample());
        assert_eq!(text, "Tree (5 nodes):\n- docs/\n- notes\n");
        assert_eq!(TreeDebug::new().format(&TreeStore::new()), "Tree (0 nodes):\n  (empty)\n");
    }
}
