//! Generic ordered-tree interface consumed by views.
//!
//! A view never touches nodes directly. It navigates with the index-based
//! [`TreeModel`] methods, reads cells through [`Column`], and keeps itself in
//! sync by applying [`TreeEvent`]s in the order they are delivered. Handles are
//! not cached across mutations; the event stream is the staleness signal.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::info::FileInfo;
use crate::tree::NodeId;

/// Display text of a placeholder row.
pub const PLACEHOLDER_LABEL: &str = "(no subdirectory)";

/// Sibling indices from the top level down to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath(Vec<usize>);

impl TreePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Number of levels (1 for the top-level row).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the parent row, `None` for top-level rows.
    pub fn parent(&self) -> Option<TreePath> {
        match self.0.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(TreePath(rest.to_vec())),
            _ => None,
        }
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = std::num::ParseIntError;

    /// Parses the colon separated form produced by `Display`, e.g. `0:3:1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(':')
            .map(str::parse)
            .collect::<Result<Vec<usize>, _>>()
            .map(TreePath)
    }
}

/// Structural change notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A row now exists at `path`.
    RowInserted { path: TreePath, node: NodeId },
    /// The row at `path` is gone. Emitted before the node is unlinked.
    RowDeleted { path: TreePath },
    /// The row at `path` went from no children to some (or back).
    HasChildToggled { path: TreePath, node: NodeId },
}

impl TreeEvent {
    pub fn path(&self) -> &TreePath {
        match self {
            TreeEvent::RowInserted { path, .. }
            | TreeEvent::RowDeleted { path }
            | TreeEvent::HasChildToggled { path, .. } => path,
        }
    }
}

/// Cell identifiers understood by [`TreeModel::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Icon,
    DisplayName,
    FileInfo,
}

/// Icon hint for a real row. Views map this to whatever artwork they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Folder,
    FolderLink,
}

impl Icon {
    pub fn for_info(info: &FileInfo) -> Self {
        if info.is_symlink() {
            Icon::FolderLink
        } else {
            Icon::Folder
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Icon(Icon),
    Text(String),
    Info(Arc<FileInfo>),
}

/// Read-only navigation over an ordered tree.
///
/// `None` as a parent means the invisible root, whose children are the
/// top-level rows. Every method answers "not found" for stale handles rather
/// than panicking.
pub trait TreeModel {
    type Handle: Copy + Eq;

    fn child_count(&self, parent: Option<Self::Handle>) -> usize;

    fn nth_child(&self, parent: Option<Self::Handle>, n: usize) -> Option<Self::Handle>;

    fn child_index(&self, parent: Option<Self::Handle>, child: Self::Handle) -> Option<usize>;

    /// Parent row, or `None` for top-level rows.
    fn parent(&self, node: Self::Handle) -> Option<Self::Handle>;

    fn value(&self, node: Self::Handle, column: Column) -> Option<Value>;

    fn has_children(&self, node: Self::Handle) -> bool {
        self.child_count(Some(node)) != 0
    }

    fn tree_path(&self, node: Self::Handle) -> Option<TreePath> {
        let mut indices = Vec::new();
        let mut current = node;
        loop {
            let parent = self.parent(current);
            indices.push(self.child_index(parent, current)?);
            match parent {
                Some(p) => current = p,
                None => break,
            }
        }
        indices.reverse();
        Some(TreePath(indices))
    }

    fn node_at(&self, path: &TreePath) -> Option<Self::Handle> {
        let mut current = None;
        for &index in path.indices() {
            current = Some(self.nth_child(current, index)?);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        let path = TreePath::new(vec![0, 3, 1]);
        assert_eq!(path.to_string(), "0:3:1");
        assert_eq!("0:3:1".parse::<TreePath>().unwrap(), path);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("0:x".parse::<TreePath>().is_err());
        assert!("".parse::<TreePath>().is_err());
    }

    #[test]
    fn parent_of_nested_path() {
        let path = TreePath::new(vec![0, 2, 5]);
        assert_eq!(path.parent(), Some(TreePath::new(vec![0, 2])));
        assert_eq!(TreePath::new(vec![0]).parent(), None);
        assert_eq!(path.depth(), 3);
    }

    /// A fixed two-level tree: top row 0 with children 1 and 2.
    struct Fixed;

    impl TreeModel for Fixed {
        type Handle = u8;

        fn child_count(&self, parent: Option<u8>) -> usize {
            match parent {
                None => 1,
                Some(0) => 2,
                Some(_) => 0,
            }
        }

        fn nth_child(&self, parent: Option<u8>, n: usize) -> Option<u8> {
            match (parent, n) {
                (None, 0) => Some(0),
                (Some(0), 0) => Some(1),
                (Some(0), 1) => Some(2),
                _ => None,
            }
        }

        fn child_index(&self, parent: Option<u8>, child: u8) -> Option<usize> {
            match (parent, child) {
                (None, 0) => Some(0),
                (Some(0), 1) => Some(0),
                (Some(0), 2) => Some(1),
                _ => None,
            }
        }

        fn parent(&self, node: u8) -> Option<u8> {
            match node {
                1 | 2 => Some(0),
                _ => None,
            }
        }

        fn value(&self, _node: u8, _column: Column) -> Option<Value> {
            None
        }
    }

    #[test]
    fn default_path_helpers_round_trip() {
        let model = Fixed;
        let path = model.tree_path(2).unwrap();
        assert_eq!(path.indices(), &[0, 1]);
        assert_eq!(model.node_at(&path), Some(2));
        assert!(model.has_children(0));
        assert!(!model.has_children(1));
    }

    #[test]
    fn unknown_handle_has_no_path() {
        assert_eq!(Fixed.tree_path(9), None);
        assert_eq!(Fixed.node_at(&TreePath::new(vec![0, 7])), None);
    }
}
