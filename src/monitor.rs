//! Per-directory change monitors built on `notify-debouncer-full`.
//!
//! A monitor only produces [`MonitorEvent`]s; it never touches the tree. The
//! backend thread pushes events into a crossbeam channel and the thread that
//! owns the tree drains it, so every tree mutation stays on one thread.

use crossbeam_channel::{Receiver, Sender};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Handle for one installed watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    pub fn from_raw(raw: u64) -> Self {
        WatchId(raw)
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorEventKind {
    Create,
    Delete,
    Change,
}

/// A change to the entry `name` inside the directory watched by `watch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub watch: WatchId,
    pub kind: MonitorEventKind,
    pub name: OsString,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to watch {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to create debouncer: {0}")]
    Backend(#[from] notify::Error),
}

/// Source of directory change events, one watch per expanded directory.
pub trait DirMonitor {
    /// Start watching `dir` (not recursively).
    fn add(&mut self, dir: &Path) -> Result<WatchId, MonitorError>;

    /// Stop a watch. Unknown ids are ignored.
    fn remove(&mut self, id: WatchId);

    /// Receiver for events of every watch installed through this monitor.
    fn events(&self) -> Receiver<MonitorEvent>;
}

#[derive(Default)]
struct Routes {
    by_dir: HashMap<PathBuf, Vec<WatchId>>,
    dirs: HashMap<WatchId, PathBuf>,
}

impl Routes {
    fn insert(&mut self, id: WatchId, dir: PathBuf) -> bool {
        let ids = self.by_dir.entry(dir.clone()).or_default();
        let first = ids.is_empty();
        ids.push(id);
        self.dirs.insert(id, dir);
        first
    }

    /// Forget `id`; returns the directory when it was its last watch.
    fn remove(&mut self, id: WatchId) -> Option<PathBuf> {
        let dir = self.dirs.remove(&id)?;
        let ids = self.by_dir.get_mut(&dir)?;
        ids.retain(|w| *w != id);
        if ids.is_empty() {
            self.by_dir.remove(&dir);
            Some(dir)
        } else {
            None
        }
    }

    fn targets(&self, dir: &Path) -> &[WatchId] {
        self.by_dir.get(dir).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Monitor backed by the platform's recommended notify watcher.
pub struct NotifyMonitor {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    routes: Arc<Mutex<Routes>>,
    next_id: u64,
    rx: Receiver<MonitorEvent>,
}

impl NotifyMonitor {
    pub fn new(debounce: Duration) -> Result<Self, MonitorError> {
        let (tx, rx): (Sender<MonitorEvent>, Receiver<MonitorEvent>) = crossbeam_channel::unbounded();
        let routes = Arc::new(Mutex::new(Routes::default()));
        let callback_routes = Arc::clone(&routes);

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let routes = callback_routes.lock();
                    for event in &events {
                        for (path, kind) in translate(&event.event) {
                            dispatch(&routes, &tx, &path, kind);
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!("file monitor error: {error}");
                    }
                }
            }
        })?;

        Ok(Self {
            debouncer,
            routes,
            next_id: 1,
            rx,
        })
    }
}

impl DirMonitor for NotifyMonitor {
    fn add(&mut self, dir: &Path) -> Result<WatchId, MonitorError> {
        // One kernel watch per inode: aliases of a directory share a route.
        let dir = dir
            .canonicalize()
            .map_err(|_| MonitorError::NotFound(dir.to_path_buf()))?;

        let id = WatchId(self.next_id);
        self.next_id += 1;

        let first = self.routes.lock().insert(id, dir.clone());
        if first {
            if let Err(source) = self.debouncer.watch(&dir, RecursiveMode::NonRecursive) {
                self.routes.lock().remove(id);
                return Err(MonitorError::Watch { path: dir, source });
            }
        }
        debug!(%id, dir = %dir.display(), "watch installed");
        Ok(id)
    }

    fn remove(&mut self, id: WatchId) {
        let released = self.routes.lock().remove(id);
        if let Some(dir) = released {
            // The directory may already be gone, in which case the kernel
            // dropped the watch on its own.
            if let Err(e) = self.debouncer.unwatch(&dir) {
                debug!(%id, dir = %dir.display(), "unwatch failed: {e}");
            }
        }
        debug!(%id, "watch removed");
    }

    fn events(&self) -> Receiver<MonitorEvent> {
        self.rx.clone()
    }
}

/// Monitor that hands out ids but never reports anything. Used when the
/// caller only wants a snapshot of the tree.
pub struct NullMonitor {
    next_id: u64,
    rx: Receiver<MonitorEvent>,
    // Keeps the channel connected so receivers block instead of erroring.
    _tx: Sender<MonitorEvent>,
}

impl NullMonitor {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            next_id: 1,
            rx,
            _tx: tx,
        }
    }
}

impl Default for NullMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl DirMonitor for NullMonitor {
    fn add(&mut self, _dir: &Path) -> Result<WatchId, MonitorError> {
        let id = WatchId(self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    fn remove(&mut self, _id: WatchId) {}

    fn events(&self) -> Receiver<MonitorEvent> {
        self.rx.clone()
    }
}

/// Map a raw notify event onto per-path create/delete/change kinds.
fn translate(event: &notify::Event) -> Vec<(PathBuf, MonitorEventKind)> {
    use MonitorEventKind::*;

    match event.kind {
        EventKind::Create(_) => event.paths.iter().map(|p| (p.clone(), Create)).collect(),
        EventKind::Remove(_) => event.paths.iter().map(|p| (p.clone(), Delete)).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
            (RenameMode::Both, [from, to, ..]) => vec![(from.clone(), Delete), (to.clone(), Create)],
            (RenameMode::From, paths) => paths.iter().map(|p| (p.clone(), Delete)).collect(),
            (RenameMode::To, paths) => paths.iter().map(|p| (p.clone(), Create)).collect(),
            // Backends that cannot tell the two halves apart: look at the disk.
            (_, paths) => paths
                .iter()
                .map(|p| {
                    let kind = if p.symlink_metadata().is_ok() { Create } else { Delete };
                    (p.clone(), kind)
                })
                .collect(),
        },
        EventKind::Modify(_) => event.paths.iter().map(|p| (p.clone(), Change)).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Send one event to every watch registered for the parent of `path`.
fn dispatch(routes: &Routes, tx: &Sender<MonitorEvent>, path: &Path, kind: MonitorEventKind) {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return;
    };
    for &watch in routes.targets(dir) {
        let _ = tx.send(MonitorEvent {
            watch,
            kind,
            name: name.to_os_string(),
        });
    }
}
