use slotmap::new_key_type;
use std::ffi::OsStr;
use std::sync::Arc;

use crate::info::FileInfo;
use crate::monitor::WatchId;

new_key_type! {
    /// Handle to a row of a [`DirTree`](super::DirTree).
    ///
    /// A handle stays valid until its node is destroyed; after that every
    /// lookup with it reports "not found", even if the slot is reused.
    pub struct NodeId;
}

/// One directory (or placeholder) in the arena.
#[derive(Debug)]
pub(super) struct Node {
    /// `None` for the hidden root and for placeholders.
    pub info: Option<Arc<FileInfo>>,
    /// `None` only for the hidden root.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Number of views that currently have this row expanded.
    pub n_expand: u32,
    /// Present only while `n_expand > 0`.
    pub watch: Option<WatchId>,
}

impl Node {
    pub fn root() -> Self {
        Self {
            info: None,
            parent: None,
            children: Vec::new(),
            n_expand: 0,
            watch: None,
        }
    }

    pub fn placeholder(parent: NodeId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::root()
        }
    }

    pub fn directory(parent: NodeId, info: Arc<FileInfo>) -> Self {
        Self {
            info: Some(info),
            parent: Some(parent),
            ..Self::root()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.info.is_none() && self.parent.is_some()
    }

    pub fn name(&self) -> Option<&OsStr> {
        self.info.as_deref().map(FileInfo::name)
    }
}
