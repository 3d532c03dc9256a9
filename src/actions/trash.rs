//! Recoverable move-to-trash.
//!
//! # Overview
//!
//! [`TrashManager`] relocates files into a `Trash/` subdirectory of the
//! scanned folder. Nothing is ever deleted:
//! - Destination names are collision-free (`photo.jpg`, `photo_1.jpg`,
//!   `photo_2.jpg`, ...) and existing files are never overwritten
//! - Moves use `rename`; across volumes the file is copied, then the source
//!   removed
//! - One failing file never aborts the batch; its name is reported in
//!   [`TrashOperationResult::failed`]
//! - [`TrashManager::restore`] moves files back out of the trash
//!
//! Only one operation may run per manager at a time. A call made while
//! another is in progress returns [`TrashError::Busy`] without touching the
//! filesystem.
//!
//! The manager does not update scan results. After a move the caller must
//! prune the moved paths (see `TriageSession::apply_trash`).
//!
//! # Example
//!
//! ```no_run
//! use photosift::actions::TrashManager;
//! use std::path::{Path, PathBuf};
//!
//! let manager = TrashManager::default();
//! let result = manager
//!     .move_to_trash(&[PathBuf::from("/photos/blurry.jpg")], Path::new("/photos"))
//!     .unwrap();
//! println!("{}", result.summary());
//! ```

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;

use crate::scanner::path_utils::{file_name_lossy, free_destination};
use crate::scanner::DEFAULT_TRASH_DIR;

/// Errors that stop a trash operation before any file is moved.
#[derive(Debug, Error)]
pub enum TrashError {
    /// Another operation is already running on this manager.
    #[error("a trash operation is already in progress")]
    Busy,

    /// The base folder does not exist or is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The trash directory could not be created.
    #[error("cannot create trash directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One relocated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrashedFile {
    /// Where the file was
    pub source: PathBuf,
    /// Where the file is now
    pub destination: PathBuf,
}

/// Outcome of one move or restore call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrashOperationResult {
    /// Number of files moved
    pub moved_count: usize,
    /// Every move that succeeded, in request order
    pub moved: Vec<TrashedFile>,
    /// File names that could not be moved
    pub failed: Vec<String>,
}

impl TrashOperationResult {
    /// Source paths of the successful moves.
    #[must_use]
    pub fn moved_sources(&self) -> Vec<PathBuf> {
        self.moved.iter().map(|m| m.source.clone()).collect()
    }

    /// Check if every requested file moved.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// "N moved, M failed: [list]".
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("{} moved", self.moved_count)
        } else {
            format!(
                "{} moved, {} failed: [{}]",
                self.moved_count,
                self.failed.len(),
                self.failed.join(", ")
            )
        }
    }

    fn record_move(&mut self, source: PathBuf, destination: PathBuf) {
        self.moved_count += 1;
        self.moved.push(TrashedFile {
            source,
            destination,
        });
    }
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Moves files into and out of the per-folder trash directory.
#[derive(Debug)]
pub struct TrashManager {
    trash_dir_name: String,
    busy: AtomicBool,
}

impl Default for TrashManager {
    fn default() -> Self {
        Self::new(DEFAULT_TRASH_DIR)
    }
}

impl TrashManager {
    /// Create a manager using `trash_dir_name` under each base folder.
    #[must_use]
    pub fn new(trash_dir_name: impl Into<String>) -> Self {
        Self {
            trash_dir_name: trash_dir_name.into(),
            busy: AtomicBool::new(false),
        }
    }

    /// Name of the trash directory.
    #[must_use]
    pub fn trash_dir_name(&self) -> &str {
        &self.trash_dir_name
    }

    /// Trash directory for `base_folder`.
    #[must_use]
    pub fn trash_dir(&self, base_folder: &Path) -> PathBuf {
        base_folder.join(&self.trash_dir_name)
    }

    /// Whether an operation is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Move `paths` into the trash directory of `base_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`TrashError`] only when the operation cannot start: another
    /// call is running, the base folder is missing, or the trash directory
    /// cannot be created. Per-file failures are reported in the result.
    pub fn move_to_trash(
        &self,
        paths: &[PathBuf],
        base_folder: &Path,
    ) -> Result<TrashOperationResult, TrashError> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(TrashError::Busy)?;
        let trash = self.ensure_trash_dir(base_folder)?;
        let mut result = TrashOperationResult::default();

        for path in paths {
            let name = file_name_lossy(path);
            let Some(file_name) = path.file_name() else {
                log::warn!("Not a file path: {}", path.display());
                result.failed.push(name);
                continue;
            };
            if path.parent() == Some(trash.as_path()) {
                log::warn!("Already in trash: {}", path.display());
                result.failed.push(name);
                continue;
            }

            let destination = free_destination(&trash, file_name);
            match move_file(path, &destination) {
                Ok(()) => {
                    log::info!("Moved to trash: {} -> {}", path.display(), destination.display());
                    result.record_move(path.clone(), destination);
                }
                Err(e) => {
                    log::warn!("Failed to move {} to trash: {}", path.display(), e);
                    result.failed.push(name);
                }
            }
        }

        log::info!("Trash: {}", result.summary());
        Ok(result)
    }

    /// Move files named `names` from the trash back into `base_folder`.
    ///
    /// Uses the same collision rule, so a restored file never overwrites a
    /// file that reappeared in the base folder.
    ///
    /// # Errors
    ///
    /// Returns [`TrashError::Busy`] or [`TrashError::NotADirectory`]; per-file
    /// failures are reported in the result.
    pub fn restore<S: AsRef<OsStr>>(
        &self,
        names: &[S],
        base_folder: &Path,
    ) -> Result<TrashOperationResult, TrashError> {
        let _guard = BusyGuard::acquire(&self.busy).ok_or(TrashError::Busy)?;
        if !base_folder.is_dir() {
            return Err(TrashError::NotADirectory(base_folder.to_path_buf()));
        }
        let trash = self.trash_dir(base_folder);
        let mut result = TrashOperationResult::default();

        for name in names {
            let name = name.as_ref();
            // Only bare file names; anything else could escape the trash.
            if Path::new(name).file_name() != Some(name) {
                log::warn!("Refusing to restore {:?}: not a plain file name", name);
                result.failed.push(name.to_string_lossy().into_owned());
                continue;
            }

            let source = trash.join(name);
            let destination = free_destination(base_folder, name);
            match move_file(&source, &destination) {
                Ok(()) => {
                    log::info!("Restored {} -> {}", source.display(), destination.display());
                    result.record_move(source, destination);
                }
                Err(e) => {
                    log::warn!("Failed to restore {}: {}", source.display(), e);
                    result.failed.push(name.to_string_lossy().into_owned());
                }
            }
        }

        Ok(result)
    }

    /// Number of entries in the trash directory of `base_folder` (0 if absent).
    #[must_use]
    pub fn trashed_count(&self, base_folder: &Path) -> usize {
        fs::read_dir(self.trash_dir(base_folder))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().map(|t| !t.is_dir()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    fn ensure_trash_dir(&self, base_folder: &Path) -> Result<PathBuf, TrashError> {
        if !base_folder.is_dir() {
            return Err(TrashError::NotADirectory(base_folder.to_path_buf()));
        }
        let trash = self.trash_dir(base_folder);
        fs::create_dir_all(&trash).map_err(|source| TrashError::CreateDir {
            path: trash.clone(),
            source,
        })?;
        Ok(trash)
    }
}

/// Move `source` to `destination`, falling back to copy + remove across volumes.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!("Cross-device move for {}, copying", source.display());
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

/// Copy then delete the source. Leaves no partial copy behind on failure.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(source, destination) {
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source) {
        // Source still in place: drop the copy so the file exists exactly once.
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}
