#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use dirtree::cli::Args;
use dirtree::event_loop::{self, Exit};
use dirtree::monitor::{DirMonitor, NotifyMonitor, NullMonitor};
use dirtree::render::{render_rows, visible_rows};
use dirtree::tree::DirTree;
use std::io::{BufWriter, Write};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run_app() {
        eprintln!("dirtree: {e:#}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let args = Args::parse().validated();
    init_tracing(args.log_level());

    let path = args
        .path
        .canonicalize()
        .with_context(|| format!("{}: failed to resolve path", args.path.display()))?;

    anyhow::ensure!(path.is_dir(), "{}: Not a directory", path.display());

    let monitor: Box<dyn DirMonitor> = if args.watch {
        let monitor = NotifyMonitor::new(Duration::from_millis(args.debounce_ms))
            .context("failed to start file monitor")?;
        Box::new(monitor)
    } else {
        Box::new(NullMonitor::new())
    };

    let mut tree = DirTree::new(args.tree_config(path.clone()), monitor)
        .context("failed to build directory tree")?;

    let top = tree.top_level();
    tree.expand_row(top);
    for relative in &args.expand {
        if tree.expand_path(relative).is_none() {
            warn!("{}: no such directory under {}", relative.display(), path.display());
        }
    }

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let rows = visible_rows(&tree, |node| tree.is_expanded(node));
    render_rows(&mut out, &rows).context("failed to write tree")?;
    out.flush()?;

    if !args.watch {
        return Ok(());
    }

    info!(
        "watching {} (debounce={}ms)",
        path.display(),
        args.debounce_ms
    );

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    let exit = event_loop::run(&mut tree, &shutdown_rx, &mut out, args.quiet)
        .context("failed to write notifications")?;
    match exit {
        Exit::Shutdown => Ok(()),
        Exit::MonitorClosed => anyhow::bail!("file monitor stopped unexpectedly"),
        Exit::RootDeleted => anyhow::bail!("{}: directory deleted", path.display()),
    }
}

fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
