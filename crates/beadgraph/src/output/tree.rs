//! Tree rendering with ASCII/Unicode connectors.
//!
//! Used for the execution plan (tracks and their items) and for blockers
//! with the issues they hold up.

use std::io::{self, Write};

use super::OutputConfig;
use super::color::dimmed;

/// One pre-rendered line plus its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Text for this line, already styled
    pub label: String,
    /// Nested lines
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node with no children.
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// A node with children.
    #[must_use]
    pub fn with_children(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }
}

/// Writes `root` and its descendants:
///
/// ```text
/// track-1 Ready now
/// ├── bv-1 P1 Fix the parser
/// │   └── unblocks bv-4
/// └── bv-2 P2 Add docs
/// ```
pub fn write_tree<W: Write>(w: &mut W, root: &TreeNode, config: &OutputConfig) -> io::Result<()> {
    writeln!(w, "{}", root.label)?;
    write_children(w, &root.children, &[], config)
}

/// `prefix_segments` records, per ancestor level, whether more siblings
/// follow; those levels get a vertical continuation line.
fn write_children<W: Write>(
    w: &mut W,
    children: &[TreeNode],
    prefix_segments: &[bool],
    config: &OutputConfig,
) -> io::Result<()> {
    let (branch, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();

        let mut prefix = String::new();
        for &has_more in prefix_segments {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { branch }, config);
        writeln!(w, "{prefix}{connector}{}", child.label)?;

        if !child.children.is_empty() {
            let mut next = prefix_segments.to_vec();
            next.push(!is_last);
            write_children(w, &child.children, &next, config)?;
        }
    }
    Ok(())
}
