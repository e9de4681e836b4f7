use crossbeam_channel::{Receiver, Sender};
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::node::{Node, NodeId};
use super::walk::{accepts_info, accepts_name, scan_subdirs};
use super::TreeConfig;
use crate::error::{Error, Result};
use crate::info::FileInfo;
use crate::model::{Column, Icon, TreeEvent, TreeModel, Value, PLACEHOLDER_LABEL};
use crate::monitor::{DirMonitor, MonitorEvent, MonitorEventKind, WatchId};

/// A directory hierarchy that is read from disk one level at a time, as rows
/// are expanded, and patched in place from file monitor events.
///
/// Every directory row is born with a single placeholder child so that views
/// can show an expander without scanning. The placeholder is replaced by the
/// real subdirectories on first expansion, and comes back whenever the last
/// real child disappears.
///
/// The tree is single-threaded. Monitor events reach it only through
/// [`DirTree::process_events`] or [`DirTree::handle_monitor_event`], called on
/// the owning thread.
pub struct DirTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    config: TreeConfig,
    monitor: Box<dyn DirMonitor>,
    watches: HashMap<WatchId, NodeId>,
    monitor_rx: Receiver<MonitorEvent>,
    subscribers: Vec<Sender<TreeEvent>>,
}

impl DirTree {
    /// Build a tree whose single top-level row is `config.root`.
    pub fn new(config: TreeConfig, monitor: Box<dyn DirMonitor>) -> Result<Self> {
        let info = FileInfo::root(&config.root)?;
        if !info.is_dir() {
            return Err(Error::NotADirectory(config.root.clone()));
        }

        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::root());
        let monitor_rx = monitor.events();

        let mut tree = Self {
            nodes,
            root,
            config,
            monitor,
            watches: HashMap::new(),
            monitor_rx,
            subscribers: Vec::new(),
        };
        let top = tree.new_directory(root, Arc::new(info));
        tree.nodes[root].children.push(top);
        Ok(tree)
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The row for the configured root directory.
    pub fn top_level(&self) -> NodeId {
        self.nodes[self.root].children[0]
    }

    /// Receive every structural change from now on.
    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// A receiver for raw monitor events, for callers that multiplex it with
    /// other channels. Each event must then be passed to
    /// [`handle_monitor_event`](Self::handle_monitor_event).
    pub fn monitor_events(&self) -> Receiver<MonitorEvent> {
        self.monitor_rx.clone()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn is_placeholder(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(Node::is_placeholder)
    }

    pub fn is_expanded(&self, node: NodeId) -> bool {
        self.expand_count(node) > 0
    }

    /// How many views currently have `node` expanded.
    pub fn expand_count(&self, node: NodeId) -> u32 {
        self.nodes.get(node).map_or(0, |n| n.n_expand)
    }

    pub fn is_watched(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.watch.is_some())
    }

    /// Number of live watches held by the whole tree.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    pub fn info(&self, node: NodeId) -> Option<&Arc<FileInfo>> {
        self.nodes.get(node)?.info.as_ref()
    }

    /// The real child of `parent` whose on-disk name is `name`.
    pub fn find_child(&self, parent: NodeId, name: &OsStr) -> Option<NodeId> {
        self.nodes
            .get(parent)?
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].name() == Some(name))
    }

    /// Absolute path of the directory behind `node`, or `None` for
    /// placeholders and stale handles.
    pub fn dir_path(&self, node: NodeId) -> Option<PathBuf> {
        if node == self.root {
            return None;
        }
        let mut names = Vec::new();
        let mut current = node;
        while current != self.root {
            let n = self.nodes.get(current)?;
            names.push(n.name()?);
            current = n.parent?;
        }
        let mut path = PathBuf::new();
        for name in names.iter().rev() {
            path.push(name);
        }
        Some(path)
    }

    /// Expand the top-level row and then each component of `relative`,
    /// returning the row for the last one.
    pub fn expand_path(&mut self, relative: &Path) -> Option<NodeId> {
        let mut node = self.top_level();
        self.expand_row(node);
        for component in relative.components() {
            match component {
                std::path::Component::Normal(name) => {
                    node = self.find_child(node, name)?;
                    self.expand_row(node);
                }
                std::path::Component::CurDir => {}
                _ => return None,
            }
        }
        Some(node)
    }

    /// Register one more view that shows the children of `node`.
    ///
    /// The first expansion scans the directory and starts watching it; later
    /// ones only count. An unreadable directory keeps its placeholder.
    pub fn expand_row(&mut self, node: NodeId) {
        let Some(n) = self.nodes.get_mut(node) else {
            trace!(?node, "expand on stale handle");
            return;
        };
        if n.info.is_none() {
            return;
        }
        n.n_expand += 1;
        if n.n_expand > 1 {
            return;
        }

        let populated = self.has_real_children(node);
        let Some(dir) = self.dir_path(node) else {
            return;
        };
        if populated {
            self.reconcile(node, &dir);
        } else {
            self.populate(node, &dir);
        }
    }

    /// Drop one view's expansion of `node`. When none remain, small
    /// directories release their children and their watch.
    pub fn collapse_row(&mut self, node: NodeId) {
        let Some(n) = self.nodes.get_mut(node) else {
            trace!(?node, "collapse on stale handle");
            return;
        };
        if n.n_expand == 0 {
            return;
        }
        n.n_expand -= 1;
        if n.n_expand > 0 {
            return;
        }
        let child_count = n.children.len();

        self.unwatch(node);
        if child_count > self.config.retain_threshold {
            debug!(?node, child_count, "keeping children of large directory");
            return;
        }
        self.release_children(node);
    }

    /// Apply every monitor event queued so far. Returns how many were read.
    pub fn process_events(&mut self) -> usize {
        let pending: Vec<MonitorEvent> = self.monitor_rx.try_iter().collect();
        for event in &pending {
            self.handle_monitor_event(event);
        }
        pending.len()
    }

    /// Apply one monitor event. Events for watches that are gone are ignored.
    pub fn handle_monitor_event(&mut self, event: &MonitorEvent) {
        let Some(&node) = self.watches.get(&event.watch) else {
            trace!(watch = %event.watch, "event for released watch ignored");
            return;
        };
        if !self.nodes.contains_key(node) {
            trace!(watch = %event.watch, "event for destroyed node ignored");
            return;
        }

        match event.kind {
            MonitorEventKind::Create => self.on_created(node, &event.name),
            MonitorEventKind::Delete => {
                if let Some(child) = self.find_child(node, &event.name) {
                    self.delete_child(child);
                }
            }
            MonitorEventKind::Change => {}
        }
    }

    fn populate(&mut self, node: NodeId, dir: &Path) {
        let found = match scan_subdirs(dir, &self.config) {
            Ok(found) => found,
            Err(e) => {
                debug!(dir = %dir.display(), "cannot read directory: {e}");
                return;
            }
        };
        for info in found {
            self.insert_child(node, info);
        }
        self.watch(node, dir);
        self.remove_placeholder(node);
    }

    /// Bring the children of a retained directory back in line with the disk.
    fn reconcile(&mut self, node: NodeId, dir: &Path) {
        let found = match scan_subdirs(dir, &self.config) {
            Ok(found) => found,
            Err(e) => {
                debug!(dir = %dir.display(), "cannot read retained directory: {e}");
                self.release_children(node);
                return;
            }
        };
        self.watch(node, dir);

        let on_disk: HashSet<OsString> = found.iter().map(|i| i.name().to_os_string()).collect();
        let vanished: Vec<NodeId> = self.nodes[node]
            .children
            .iter()
            .copied()
            .filter(|&c| {
                self.nodes[c]
                    .name()
                    .is_some_and(|name| !on_disk.contains(name))
            })
            .collect();
        let (mut added, removed) = (0usize, vanished.len());
        for child in vanished {
            self.delete_child(child);
        }
        for info in found {
            if self.find_child(node, info.name()).is_none() {
                self.insert_child(node, info);
                added += 1;
            }
        }
        self.remove_placeholder(node);
        debug!(dir = %dir.display(), added, removed, "reconciled retained directory");
    }

    fn on_created(&mut self, node: NodeId, name: &OsStr) {
        if self.find_child(node, name).is_some() || !accepts_name(name, &self.config) {
            return;
        }
        let Some(dir) = self.dir_path(node) else {
            return;
        };
        let info = match FileInfo::load(&dir.join(name)) {
            Ok(info) if accepts_info(&info, &self.config) => info,
            _ => return,
        };
        self.insert_child(node, info);
        self.remove_placeholder(node);
    }

    fn watch(&mut self, node: NodeId, dir: &Path) {
        self.unwatch(node);
        match self.monitor.add(dir) {
            Ok(id) => {
                self.nodes[node].watch = Some(id);
                self.watches.insert(id, node);
            }
            Err(e) => warn!(dir = %dir.display(), "cannot monitor directory: {e}"),
        }
    }

    fn unwatch(&mut self, node: NodeId) {
        let released = self.nodes.get_mut(node).and_then(|n| n.watch.take());
        if let Some(id) = released {
            self.release_watch(id);
        }
    }

    fn release_watch(&mut self, id: WatchId) {
        self.watches.remove(&id);
        self.monitor.remove(id);
    }

    /// Delete every real child of `node`, leaving only the placeholder.
    fn release_children(&mut self, node: NodeId) {
        if !self.has_real_children(node) {
            return;
        }
        while let Some(&child) = self.nodes[node].children.first() {
            let was_last = self.nodes[node].children.len() == 1;
            self.delete_child(child);
            if was_last {
                break;
            }
        }
    }

    fn has_real_children(&self, node: NodeId) -> bool {
        self.nodes[node]
            .children
            .iter()
            .any(|&c| self.nodes[c].info.is_some())
    }

    /// Allocate a directory node together with its placeholder child. The
    /// caller links it into `parent`.
    fn new_directory(&mut self, parent: NodeId, info: Arc<FileInfo>) -> NodeId {
        let node = self.nodes.insert(Node::directory(parent, info));
        let placeholder = self.nodes.insert(Node::placeholder(node));
        self.nodes[node].children.push(placeholder);
        node
    }

    /// Insert `info` under `parent` at its sorted position.
    fn insert_child(&mut self, parent: NodeId, info: FileInfo) -> NodeId {
        let order = self.config.sort_order;
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&c| match self.nodes[c].info.as_deref() {
                Some(existing) => order.compare(existing.disp_name(), info.disp_name()).is_ge(),
                None => true,
            })
            .unwrap_or(self.nodes[parent].children.len());

        let child = self.new_directory(parent, Arc::new(info));
        self.nodes[parent].children.insert(position, child);

        if let Some(path) = self.tree_path(child) {
            self.emit(TreeEvent::RowInserted {
                path: path.clone(),
                node: child,
            });
            self.emit(TreeEvent::HasChildToggled { path, node: child });
        }
        child
    }

    fn insert_placeholder(&mut self, parent: NodeId) {
        let placeholder = self.nodes.insert(Node::placeholder(parent));
        self.nodes[parent].children.push(placeholder);
        if let Some(path) = self.tree_path(placeholder) {
            self.emit(TreeEvent::RowInserted {
                path,
                node: placeholder,
            });
        }
    }

    fn remove_placeholder(&mut self, node: NodeId) {
        let children = &self.nodes[node].children;
        if children.len() < 2 {
            return;
        }
        let placeholder = children.iter().copied().find(|&c| self.nodes[c].is_placeholder());
        if let Some(placeholder) = placeholder {
            self.delete_child(placeholder);
        }
    }

    /// Remove `node` and its subtree, announcing the removal first. A parent
    /// left without children gets its placeholder back.
    fn delete_child(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(path) = self.tree_path(node) {
            self.emit(TreeEvent::RowDeleted { path });
        }

        self.nodes[parent].children.retain(|&c| c != node);
        self.destroy(node);

        if self.nodes[parent].children.is_empty() {
            self.insert_placeholder(parent);
        }
    }

    /// Free `node` and all descendants, releasing every watch among them.
    fn destroy(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(mut n) = self.nodes.remove(id) {
                if let Some(watch) = n.watch.take() {
                    self.release_watch(watch);
                }
                stack.extend(n.children);
            }
        }
    }

    fn emit(&mut self, event: TreeEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Drop for DirTree {
    fn drop(&mut self) {
        let watches: Vec<WatchId> = self.watches.drain().map(|(id, _)| id).collect();
        for id in watches {
            self.monitor.remove(id);
        }
    }
}

impl TreeModel for DirTree {
    type Handle = NodeId;

    fn child_count(&self, parent: Option<NodeId>) -> usize {
        let parent = parent.unwrap_or(self.root);
        self.nodes.get(parent).map_or(0, |n| n.children.len())
    }

    fn nth_child(&self, parent: Option<NodeId>, n: usize) -> Option<NodeId> {
        let parent = parent.unwrap_or(self.root);
        self.nodes.get(parent)?.children.get(n).copied()
    }

    fn child_index(&self, parent: Option<NodeId>, child: NodeId) -> Option<usize> {
        let parent = parent.unwrap_or(self.root);
        self.nodes
            .get(parent)?
            .children
            .iter()
            .position(|&c| c == child)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node)?.parent?;
        (parent != self.root).then_some(parent)
    }

    fn value(&self, node: NodeId, column: Column) -> Option<Value> {
        let n = self.nodes.get(node)?;
        if node == self.root {
            return None;
        }
        match (column, n.info.as_ref()) {
            (Column::Icon, Some(info)) => Some(Value::Icon(Icon::for_info(info))),
            (Column::Icon, None) => None,
            (Column::DisplayName, Some(info)) => Some(Value::Text(info.disp_name().to_string())),
            (Column::DisplayName, None) => Some(Value::Text(PLACEHOLDER_LABEL.to_string())),
            (Column::FileInfo, info) => info.cloned().map(Value::Info),
        }
    }
}
