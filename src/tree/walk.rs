use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::TreeConfig;
use crate::info::FileInfo;

/// Build a GlobSet from user patterns. Invalid patterns are skipped and
/// reported as a warning.
pub fn build_ignore_set(user_patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    let mut invalid = Vec::new();
    for pattern in user_patterns {
        match Glob::new(pattern) {
            Ok(g) => {
                builder.add(g);
            }
            Err(_) => {
                invalid.push(pattern.clone());
            }
        }
    }
    if !invalid.is_empty() {
        warn!("invalid ignore pattern(s), skipped: {:?}", invalid);
    }
    builder.build().unwrap_or_else(|e| {
        warn!("failed to build ignore set: {}", e);
        GlobSet::empty()
    })
}

/// Whether an entry called `name` may appear in the tree at all.
pub(crate) fn accepts_name(name: &OsStr, config: &TreeConfig) -> bool {
    let lossy = name.to_string_lossy();
    if !config.show_hidden && lossy.starts_with('.') {
        return false;
    }
    !config.ignore_patterns.is_match(lossy.as_ref())
}

/// Whether `info` describes something the tree shows as a directory row.
pub(crate) fn accepts_info(info: &FileInfo, config: &TreeConfig) -> bool {
    info.is_dir() && (config.follow_symlinks || !info.is_symlink())
}

/// List the subdirectories of `dir`, one level deep, in no particular order.
///
/// Fails only when `dir` itself cannot be read. Entries that vanish or cannot
/// be inspected while scanning are skipped.
pub fn scan_subdirs(dir: &Path, config: &TreeConfig) -> io::Result<Vec<FileInfo>> {
    if !fs::metadata(dir)?.is_dir() {
        return Err(io::Error::other(format!("{}: Not a directory", dir.display())));
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);

    let mut found = Vec::new();
    for entry_result in walker {
        match entry_result {
            Ok(entry) => {
                if !accepts_name(entry.file_name(), config) {
                    continue;
                }
                // Cheap pre-filter before touching metadata again.
                let maybe_dir = entry.file_type().is_dir()
                    || (config.follow_symlinks && entry.path_is_symlink());
                if !maybe_dir {
                    continue;
                }
                match FileInfo::load(entry.path()) {
                    Ok(info) if accepts_info(&info, config) => found.push(info),
                    Ok(_) => {}
                    Err(e) => debug!(path = %entry.path().display(), "skipping entry: {e}"),
                }
            }
            Err(e) if e.depth() == 0 || e.path() == Some(dir) => {
                return Err(e.into());
            }
            Err(e) => {
                debug!("skipping entry: {e}");
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(infos: &[FileInfo]) -> Vec<String> {
        let mut names: Vec<String> = infos.iter().map(|i| i.disp_name().to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn only_directories_are_listed() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("bin")).unwrap();
        fs::create_dir(tmp.path().join("etc")).unwrap();
        fs::write(tmp.path().join("passwd"), "").unwrap();
        fs::write(tmp.path().join("README"), "").unwrap();

        let found = scan_subdirs(tmp.path(), &TreeConfig::default()).unwrap();
        assert_eq!(names(&found), vec!["bin", "etc"]);
    }

    #[test]
    fn scan_is_one_level_deep() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();

        let found = scan_subdirs(tmp.path(), &TreeConfig::default()).unwrap();
        assert_eq!(names(&found), vec!["a"]);
    }

    #[test]
    fn hidden_directories_follow_config() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".cache")).unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();

        let mut cfg = TreeConfig::default();
        assert_eq!(names(&scan_subdirs(tmp.path(), &cfg).unwrap()), vec![".cache", "src"]);

        cfg.show_hidden = false;
        assert_eq!(names(&scan_subdirs(tmp.path(), &cfg).unwrap()), vec!["src"]);
    }

    #[test]
    fn ignore_patterns_filter_names() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("node_modules")).unwrap();
        fs::create_dir(tmp.path().join("target")).unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();

        let mut cfg = TreeConfig::default();
        cfg.ignore_patterns = build_ignore_set(&["node_modules".to_string(), "tar*".to_string()]);
        assert_eq!(names(&scan_subdirs(tmp.path(), &cfg).unwrap()), vec!["src"]);
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let set = build_ignore_set(&["[".to_string(), "*.tmp".to_string()]);
        assert!(set.is_match("x.tmp"));
        assert!(!set.is_match("src"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = scan_subdirs(&tmp.path().join("gone"), &TreeConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn regular_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, "").unwrap();

        let err = scan_subdirs(&file, &TreeConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Not a directory"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn directory_symlinks_follow_config() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("alias")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("missing"), tmp.path().join("broken")).unwrap();

        let mut cfg = TreeConfig::default();
        assert_eq!(names(&scan_subdirs(tmp.path(), &cfg).unwrap()), vec!["alias", "real"]);

        cfg.follow_symlinks = false;
        assert_eq!(names(&scan_subdirs(tmp.path(), &cfg).unwrap()), vec!["real"]);
    }
}
