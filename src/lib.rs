#![forbid(unsafe_code)]
//! dirtree: a lazily expanded directory tree whose rows follow the disk
//! through per-directory file monitors.

pub mod cli;
pub mod error;
pub mod event_loop;
pub mod info;
pub mod model;
pub mod monitor;
pub mod render;
pub mod tree;

pub use error::{Error, Result};
pub use info::FileInfo;
pub use model::{Column, Icon, TreeEvent, TreeModel, TreePath, Value};
pub use monitor::{DirMonitor, MonitorEvent, MonitorEventKind, NotifyMonitor, NullMonitor, WatchId};
pub use tree::{DirTree, NodeId, SortOrder, TreeConfig};
