//! Watch-mode loop: applies monitor events on the tree's own thread and
//! prints the resulting notifications.

use crate::model::TreeEvent;
use crate::render::describe_event;
use crate::tree::DirTree;
use crossbeam_channel::{select, Receiver};
use std::io::Write;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The shutdown channel fired or was dropped.
    Shutdown,
    /// The monitor backend went away.
    MonitorClosed,
    /// The top-level directory no longer exists.
    RootDeleted,
}

/// Run until `shutdown` fires. Every monitor event is applied to `tree` and
/// each resulting notification is written to `out` unless `quiet` is set.
pub fn run<W: Write>(
    tree: &mut DirTree,
    shutdown: &Receiver<()>,
    out: &mut W,
    quiet: bool,
) -> std::io::Result<Exit> {
    let monitor_rx = tree.monitor_events();
    let notifications = tree.subscribe();
    let root = tree.config().root.clone();

    loop {
        select! {
            recv(monitor_rx) -> msg => {
                let Ok(event) = msg else {
                    return Ok(Exit::MonitorClosed);
                };
                tree.handle_monitor_event(&event);
                let changes: Vec<TreeEvent> = notifications.try_iter().collect();
                if !quiet {
                    for change in &changes {
                        writeln!(out, "{}", describe_event(&*tree, change))?;
                    }
                    out.flush()?;
                }
                if std::fs::metadata(&root).is_err() {
                    return Ok(Exit::RootDeleted);
                }
            }
            recv(shutdown) -> _ => {
                out.flush()?;
                return Ok(Exit::Shutdown);
            }
        }
    }
}
