#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender};
use dirtree::monitor::{DirMonitor, MonitorError, MonitorEvent, MonitorEventKind, WatchId};
use dirtree::{DirTree, NodeId, TreeConfig, TreeModel};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a directory structure from a list of relative paths.
/// Paths ending with '/' create directories; others create empty files.
pub fn create_fixture(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for p in paths {
        let full = tmp.path().join(p);
        if p.ends_with('/') {
            fs::create_dir_all(&full).unwrap();
        } else {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&full, "").unwrap();
        }
    }
    tmp
}

/// Default config rooted at the canonical path of `tmp`.
pub fn config_for(tmp: &TempDir) -> TreeConfig {
    TreeConfig::rooted_at(tmp.path().canonicalize().unwrap())
}

#[derive(Default)]
struct Log {
    active: Vec<(WatchId, PathBuf)>,
    added: usize,
    removed: usize,
}

/// Monitor that records watches and lets the test inject events.
pub struct FakeMonitor {
    next_id: u64,
    log: Arc<Mutex<Log>>,
    rx: Receiver<MonitorEvent>,
}

/// Test-side view of a [`FakeMonitor`] owned by a tree.
#[derive(Clone)]
pub struct FakeHandle {
    log: Arc<Mutex<Log>>,
    tx: Sender<MonitorEvent>,
}

pub fn fake_monitor() -> (FakeMonitor, FakeHandle) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let log = Arc::new(Mutex::new(Log::default()));
    let monitor = FakeMonitor {
        next_id: 1,
        log: Arc::clone(&log),
        rx,
    };
    (monitor, FakeHandle { log, tx })
}

impl DirMonitor for FakeMonitor {
    fn add(&mut self, dir: &Path) -> Result<WatchId, MonitorError> {
        let id = WatchId::from_raw(self.next_id);
        self.next_id += 1;
        let mut log = self.log.lock();
        log.active.push((id, dir.to_path_buf()));
        log.added += 1;
        Ok(id)
    }

    fn remove(&mut self, id: WatchId) {
        let mut log = self.log.lock();
        let before = log.active.len();
        log.active.retain(|(w, _)| *w != id);
        assert_eq!(before, log.active.len() + 1, "{id} released twice or never added");
        log.removed += 1;
    }

    fn events(&self) -> Receiver<MonitorEvent> {
        self.rx.clone()
    }
}

impl FakeHandle {
    pub fn watch_for(&self, dir: &Path) -> Option<WatchId> {
        self.log
            .lock()
            .active
            .iter()
            .find(|(_, d)| d == dir)
            .map(|(id, _)| *id)
    }

    pub fn active_count(&self) -> usize {
        self.log.lock().active.len()
    }

    pub fn added_count(&self) -> usize {
        self.log.lock().added
    }

    pub fn removed_count(&self) -> usize {
        self.log.lock().removed
    }

    pub fn send(&self, watch: WatchId, kind: MonitorEventKind, name: &str) {
        self.tx
            .send(MonitorEvent {
                watch,
                kind,
                name: OsString::from(name),
            })
            .unwrap();
    }
}

/// Build a tree over `tmp` driven by a fake monitor.
pub fn fake_tree(tmp: &TempDir) -> (DirTree, FakeHandle) {
    let (monitor, handle) = fake_monitor();
    let tree = DirTree::new(config_for(tmp), Box::new(monitor)).unwrap();
    (tree, handle)
}

/// Display names of the children of `node`; placeholders show as `None`.
pub fn child_names(tree: &DirTree, node: NodeId) -> Vec<Option<String>> {
    (0..tree.child_count(Some(node)))
        .map(|i| {
            let child = tree.nth_child(Some(node), i).unwrap();
            tree.info(child).map(|info| info.disp_name().to_string())
        })
        .collect()
}

/// Names of the real children only.
pub fn real_names(tree: &DirTree, node: NodeId) -> Vec<String> {
    child_names(tree, node).into_iter().flatten().collect()
}

/// Whether `node` currently holds exactly one placeholder child.
pub fn only_placeholder(tree: &DirTree, node: NodeId) -> bool {
    tree.child_count(Some(node)) == 1
        && tree
            .nth_child(Some(node), 0)
            .is_some_and(|c| tree.is_placeholder(c))
}
