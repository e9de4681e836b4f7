mod common;

use common::{create_fixture, fake_tree};
use dirtree::event_loop::{run, Exit};
use dirtree::monitor::MonitorEventKind;
use std::fs;
use std::thread;
use std::time::Duration;

#[test]
fn test_loop_prints_notifications_until_shutdown() {
    let tmp = create_fixture(&["b/"]);
    let (mut tree, monitor) = fake_tree(&tmp);
    let top = tree.top_level();
    tree.expand_row(top);

    fs::create_dir(tmp.path().join("a")).unwrap();
    let watch = monitor.watch_for(&tree.dir_path(top).unwrap()).unwrap();
    monitor.send(watch, MonitorEventKind::Create, "a");

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        shutdown_tx.send(()).unwrap();
    });

    let mut out = Vec::new();
    let exit = run(&mut tree, &shutdown_rx, &mut out, false).unwrap();
    stopper.join().unwrap();

    assert_eq!(exit, Exit::Shutdown);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["+ 0:1 a", "* 0:1"], "{text}");
    assert_eq!(common::real_names(&tree, top), vec!["b", "a"]);
}

#[test]
fn test_quiet_loop_applies_events_silently() {
    let tmp = create_fixture(&["gone/"]);
    let (mut tree, monitor) = fake_tree(&tmp);
    let top = tree.top_level();
    tree.expand_row(top);

    fs::remove_dir(tmp.path().join("gone")).unwrap();
    let watch = monitor.watch_for(&tree.dir_path(top).unwrap()).unwrap();
    monitor.send(watch, MonitorEventKind::Delete, "gone");

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        shutdown_tx.send(()).unwrap();
    });

    let mut out = Vec::new();
    let exit = run(&mut tree, &shutdown_rx, &mut out, true).unwrap();
    stopper.join().unwrap();

    assert_eq!(exit, Exit::Shutdown);
    assert!(out.is_empty());
    assert!(common::only_placeholder(&tree, top));
}

#[test]
fn test_loop_stops_when_root_is_deleted() {
    let tmp = create_fixture(&["child/"]);
    let (mut tree, monitor) = fake_tree(&tmp);
    let top = tree.top_level();
    tree.expand_row(top);
    let watch = monitor.watch_for(&tree.dir_path(top).unwrap()).unwrap();

    let root = tmp.path().to_path_buf();
    fs::remove_dir_all(&root).unwrap();
    monitor.send(watch, MonitorEventKind::Delete, "child");

    let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    let mut out = Vec::new();
    let exit = run(&mut tree, &shutdown_rx, &mut out, false).unwrap();

    assert_eq!(exit, Exit::RootDeleted);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("- 0:0"), "{text}");
}
