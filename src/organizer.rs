//! Relocation of files into the organized tree.
//!
//! This module owns the only two filesystem mutations the tool performs:
//! creating destination directories and moving files. Both are exposed as
//! separate operations returning [`OrganizeResult`] so the caller decides
//! whether a failure aborts the run.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while relocating a file.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The source path has no file name to carry over.
    #[error("File has no name component: {}", .path.display())]
    MissingFileName { path: PathBuf },
}

/// Result type for relocation operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Leave the source file where it is.
    Skip,
    /// Pick a free name such as `report (1).pdf`.
    Rename,
}

/// A planned move from a scanned file to its organized location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    /// Where the file currently lives.
    pub source: PathBuf,
    /// Where the file goes: organized root / subdirectory / file name.
    pub destination: PathBuf,
    /// The classified subdirectory, relative to the organized root.
    pub subdirectory: PathBuf,
}

impl Relocation {
    /// The file name being carried over, for display.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Result of resolving a relocation against the current filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file was moved (or, in a preview, would be moved) to this path.
    Moved(PathBuf),
    /// The destination was occupied and the policy is [`CollisionPolicy::Skip`].
    Skipped(PathBuf),
}

/// Plans and executes moves into an organized root directory.
///
/// Destinations handed out during a run are remembered, so a preview sees
/// the same collisions the real run would.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    organized_root: PathBuf,
    policy: CollisionPolicy,
    claimed: HashSet<PathBuf>,
}

impl FileOrganizer {
    pub fn new(organized_root: impl Into<PathBuf>, policy: CollisionPolicy) -> Self {
        Self {
            organized_root: organized_root.into(),
            policy,
            claimed: HashSet::new(),
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Computes the destination of `source` under `subdirectory` without
    /// touching the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use dlorganize::organizer::{CollisionPolicy, FileOrganizer};
    /// use std::path::{Path, PathBuf};
    ///
    /// let organizer = FileOrganizer::new("/dl/organized", CollisionPolicy::Overwrite);
    /// let plan = organizer
    ///     .plan(Path::new("/dl/report.pdf"), &PathBuf::from("2023").join("03"))
    ///     .unwrap();
    /// assert_eq!(plan.destination, Path::new("/dl/organized/2023/03/report.pdf"));
    /// ```
    pub fn plan(&self, source: &Path, subdirectory: &Path) -> OrganizeResult<Relocation> {
        let file_name = source
            .file_name()
            .ok_or_else(|| OrganizeError::MissingFileName {
                path: source.to_path_buf(),
            })?;

        Ok(Relocation {
            source: source.to_path_buf(),
            destination: self.organized_root.join(subdirectory).join(file_name),
            subdirectory: subdirectory.to_path_buf(),
        })
    }

    /// Applies the collision policy to a planned destination.
    ///
    /// A path is occupied if it exists on disk or was claimed earlier in
    /// this run. Does not touch the filesystem.
    pub fn resolve(&self, relocation: &Relocation) -> MoveOutcome {
        let destination = &relocation.destination;
        if !self.is_occupied(destination) {
            return MoveOutcome::Moved(destination.clone());
        }
        match self.policy {
            CollisionPolicy::Overwrite => MoveOutcome::Moved(destination.clone()),
            CollisionPolicy::Skip => MoveOutcome::Skipped(destination.clone()),
            CollisionPolicy::Rename => {
                MoveOutcome::Moved(next_free_path(destination, |p| self.is_occupied(p)))
            }
        }
    }

    /// Resolves a relocation for a dry run and claims its target.
    pub fn preview(&mut self, relocation: &Relocation) -> MoveOutcome {
        let outcome = self.resolve(relocation);
        if let MoveOutcome::Moved(target) = &outcome {
            self.claimed.insert(target.clone());
        }
        outcome
    }

    /// Creates the destination directory and moves the file.
    ///
    /// Returns the outcome of [`FileOrganizer::resolve`]; nothing is moved
    /// for [`MoveOutcome::Skipped`].
    pub fn execute(&mut self, relocation: &Relocation) -> OrganizeResult<MoveOutcome> {
        if let Some(parent) = relocation.destination.parent() {
            ensure_directory(parent)?;
        }

        let outcome = self.resolve(relocation);
        if let MoveOutcome::Moved(target) = &outcome {
            move_file(&relocation.source, target)?;
            self.claimed.insert(target.clone());
        }
        Ok(outcome)
    }

    fn is_occupied(&self, path: &Path) -> bool {
        self.claimed.contains(path) || path.exists()
    }
}

/// Creates `path` and any missing parents. Succeeds if it already exists.
pub fn ensure_directory(path: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Moves a file, replacing any file already at `to`.
///
/// Falls back to copy-then-remove when `from` and `to` are on different
/// filesystems.
pub fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let failure = |e: io::Error| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_with_mtime(from, to).map_err(failure)?;
            fs::remove_file(from).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}

/// Copies `from` to `to` and carries over the modification time.
fn copy_with_mtime(from: &Path, to: &Path) -> io::Result<()> {
    let modified = fs::metadata(from)?.modified()?;
    fs::copy(from, to)?;
    File::options().write(true).open(to)?.set_modified(modified)
}

/// Finds the first `name (n).ext` next to `path` that is not occupied.
fn next_free_path(path: &Path, occupied: impl Fn(&Path) -> bool) -> PathBuf {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| parent.join(format!("{} ({}){}", stem, n, extension)))
        .find(|candidate| !occupied(candidate))
        .unwrap_or_else(|| path.to_path_buf())
}
