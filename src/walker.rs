//! Recursive directory walking using walkdir.
//!
//! Only regular files are reported. Symlinks are not followed and are
//! themselves skipped, as are directories and special entries. Directories
//! registered with [`DirectoryWalker::skip_dir`] are pruned entirely.

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors for individual entries that could not be read during a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Failed to read {}: {source}", .path.display())]
    Entry {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to read metadata for {}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A regular file found beneath the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// Full path as produced by the walk (root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the walk root.
    pub relative: PathBuf,
    /// Last modification time in local time.
    pub modified: DateTime<Local>,
}

/// Everything a walk produced: readable files and per-entry errors.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<ScanEntry>,
    pub errors: Vec<WalkError>,
}

/// Walks a directory tree collecting regular files.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    root: PathBuf,
    skipped_dirs: Vec<PathBuf>,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            skipped_dirs: Vec::new(),
        }
    }

    /// Prunes `dir` and everything beneath it from the walk.
    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skipped_dirs.push(dir.into());
        self
    }

    /// Walks the tree to completion.
    ///
    /// The full list is gathered before returning so callers can move files
    /// without disturbing an in-progress directory read.
    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult::default();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_skipped(entry.path()));

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    result.errors.push(WalkError::Entry { path, source: e });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path().to_path_buf();
            let modified = match entry.metadata() {
                Ok(metadata) => metadata.modified().map_err(|e| WalkError::Metadata {
                    path: path.clone(),
                    source: e,
                }),
                Err(e) => Err(WalkError::Metadata {
                    path: path.clone(),
                    source: e.into(),
                }),
            };

            match modified {
                Ok(modified) => {
                    let relative = path
                        .strip_prefix(&self.root)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| path.clone());
                    result.files.push(ScanEntry {
                        path,
                        relative,
                        modified: DateTime::<Local>::from(modified),
                    });
                }
                Err(e) => result.errors.push(e),
            }
        }

        result
    }

    fn is_skipped(&self, path: &Path) -> bool {
        self.skipped_dirs.iter().any(|dir| dir == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn relative_paths(result: &ScanResult) -> Vec<PathBuf> {
        result.files.iter().map(|f| f.relative.clone()).collect()
    }

    #[test]
    fn test_scan_is_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("top.txt"), "").unwrap();
        fs::write(root.join("a/mid.txt"), "").unwrap();
        fs::write(root.join("a/b/deep.txt"), "").unwrap();

        let result = DirectoryWalker::new(root).scan();

        assert!(result.errors.is_empty());
        assert_eq!(
            relative_paths(&result),
            vec![
                PathBuf::from("a/b/deep.txt"),
                PathBuf::from("a/mid.txt"),
                PathBuf::from("top.txt"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_directories_only_lists_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();

        let result = DirectoryWalker::new(temp_dir.path()).scan();
        assert!(result.files.is_empty());
    }

    #[test]
    fn test_scan_prunes_skipped_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("organized/2023/03")).unwrap();
        fs::write(root.join("organized/2023/03/done.txt"), "").unwrap();
        fs::write(root.join("fresh.txt"), "").unwrap();

        let result = DirectoryWalker::new(root)
            .skip_dir(root.join("organized"))
            .scan();

        assert_eq!(relative_paths(&result), vec![PathBuf::from("fresh.txt")]);
    }

    #[test]
    fn test_scan_records_modified_time() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.txt");
        fs::write(&file, "").unwrap();
        let expected = DateTime::<Local>::from(fs::metadata(&file).unwrap().modified().unwrap());

        let result = DirectoryWalker::new(temp_dir.path()).scan();

        assert_eq!(result.files[0].modified, expected);
        assert_eq!(result.files[0].path, file);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_ignores_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("real.txt"), "").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();

        let result = DirectoryWalker::new(root).scan();
        assert_eq!(relative_paths(&result), vec![PathBuf::from("real.txt")]);
    }
}
