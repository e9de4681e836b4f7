use clap::Parser;
use std::path::PathBuf;

use crate::tree::{build_ignore_set, SortOrder, TreeConfig, DEFAULT_RETAIN_THRESHOLD};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirtree",
    version,
    about = "Lazily expanded directory tree that follows the disk",
    after_help = "Examples:\n  dirtree /usr -e share -e lib\n  dirtree ~/src --watch -H -I target"
)]
pub struct Args {
    /// Directory shown as the top-level row
    #[arg(default_value = "/")]
    pub path: PathBuf,

    /// Expand this path, relative to the top-level row (repeatable)
    #[arg(short = 'e', long = "expand", action = clap::ArgAction::Append)]
    pub expand: Vec<PathBuf>,

    /// Leave out hidden directories (dot-names)
    #[arg(short = 'H', long = "hide-hidden")]
    pub hide_hidden: bool,

    /// Glob patterns for directory names to exclude (repeatable)
    #[arg(short = 'I', long = "ignore", action = clap::ArgAction::Append)]
    pub ignore: Vec<String>,

    /// Do not treat symbolic links to directories as directories
    #[arg(long = "no-follow")]
    pub no_follow: bool,

    /// Keep children of collapsed directories with more entries than this
    #[arg(long = "retain", default_value_t = DEFAULT_RETAIN_THRESHOLD)]
    pub retain: usize,

    /// Sort siblings A to Z instead of Z to A
    #[arg(long = "ascending")]
    pub ascending: bool,

    /// Keep running and print structural changes as they happen
    #[arg(short = 'w', long = "watch")]
    pub watch: bool,

    /// Debounce interval in milliseconds (minimum 50)
    #[arg(long = "debounce", default_value = "200")]
    pub debounce_ms: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Args {
    /// Enforce invariants after parsing.
    pub fn validated(mut self) -> Self {
        if self.debounce_ms < 50 {
            self.debounce_ms = 50;
        }
        self
    }

    /// Tree configuration for an already resolved root directory.
    pub fn tree_config(&self, root: PathBuf) -> TreeConfig {
        TreeConfig {
            root,
            show_hidden: !self.hide_hidden,
            follow_symlinks: !self.no_follow,
            ignore_patterns: build_ignore_set(&self.ignore),
            retain_threshold: self.retain,
            sort_order: if self.ascending {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            },
        }
    }

    /// Default `tracing` filter directive for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
