//! Metadata for a single directory entry.
//!
//! The tree keeps one `Arc<FileInfo>` per real node; callers asking for the
//! [`Column::FileInfo`](crate::model::Column::FileInfo) value get their own
//! clone of that `Arc`, so the tree and the caller release independently.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

/// Display name given to the top-level row when the tree is rooted at `/`.
pub const FILE_SYSTEM_LABEL: &str = "File System";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    name: OsString,
    disp_name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl FileInfo {
    /// Read metadata for `path`. `is_dir` follows symlinks; a dangling link is
    /// reported as a non-directory symlink rather than an error.
    pub fn load(path: &Path) -> io::Result<Self> {
        let link_meta = fs::symlink_metadata(path)?;
        let is_symlink = link_meta.file_type().is_symlink();
        let is_dir = if is_symlink {
            fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            link_meta.is_dir()
        };

        let name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| path.as_os_str().to_os_string());
        let disp_name = name.to_string_lossy().into_owned();

        Ok(Self {
            name,
            disp_name,
            is_dir,
            is_symlink,
        })
    }

    /// Metadata for the top-level row. Its name is the whole root path so that
    /// joining names from the top down yields absolute paths.
    pub fn root(path: &Path) -> io::Result<Self> {
        let mut info = Self::load(path)?;
        info.name = path.as_os_str().to_os_string();
        if path == Path::new("/") {
            info.set_disp_name(FILE_SYSTEM_LABEL);
        } else {
            info.disp_name = path.to_string_lossy().into_owned();
        }
        Ok(info)
    }

    /// On-disk name (base name, or the full root path for the top-level row).
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Human readable name used for display and ordering.
    pub fn disp_name(&self) -> &str {
        &self.disp_name
    }

    pub fn set_disp_name(&mut self, disp_name: impl Into<String>) {
        self.disp_name = disp_name.into();
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }
}
