//! The lazy directory tree: node arena, on-demand scanning, and the
//! expand/collapse/monitor protocol that keeps it in sync with the disk.

mod dir_tree;
mod node;
pub(crate) mod walk;

use globset::GlobSet;
use std::cmp::Ordering;
use std::path::PathBuf;

pub use dir_tree::DirTree;
pub use node::NodeId;
pub use walk::{build_ignore_set, scan_subdirs};

/// Directories with more children than this keep them across a collapse.
pub const DEFAULT_RETAIN_THRESHOLD: usize = 128;

/// Order of sibling rows, by case-insensitive display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    /// Z before a.
    #[default]
    Descending,
}

impl SortOrder {
    /// Compare two display names according to this order.
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        let natural = a.to_lowercase().cmp(&b.to_lowercase());
        match self {
            SortOrder::Ascending => natural,
            SortOrder::Descending => natural.reverse(),
        }
    }
}

/// Configuration for tree building.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Directory shown as the single top-level row.
    pub root: PathBuf,
    /// Whether to include hidden directories (dot-names).
    pub show_hidden: bool,
    /// Whether symbolic links to directories are shown as directories.
    pub follow_symlinks: bool,
    /// Glob patterns for directory names to leave out.
    pub ignore_patterns: GlobSet,
    /// Child count above which a collapsed directory keeps its children.
    pub retain_threshold: usize,
    pub sort_order: SortOrder,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            show_hidden: true,
            follow_symlinks: true,
            ignore_patterns: GlobSet::empty(),
            retain_threshold: DEFAULT_RETAIN_THRESHOLD,
            sort_order: SortOrder::default(),
        }
    }
}

impl TreeConfig {
    /// Default configuration rooted at `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}
