use std::path::PathBuf;

use thiserror::Error;

use crate::monitor::MonitorError;

/// Library-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while building a tree.
///
/// Everything that happens after construction (unreadable directories, stale
/// monitor events) is absorbed by the tree and only logged.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O errors while reading the root directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file monitor backend could not be created.
    #[error("file monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// The configured root exists but is not a directory.
    #[error("{}: Not a directory", .0.display())]
    NotADirectory(PathBuf),
}
