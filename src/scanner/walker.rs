//! Folder walker for image discovery using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct shared by every scanner. It
//! walks a folder recursively and yields the files whose extension is in the
//! configured set, with these rules:
//!
//! - Extensions compare case-insensitively (`a.JPG` matches `jpg`)
//! - Any path with a component equal to the trash directory name is
//!   excluded, at any depth; trash directories are pruned before descent
//! - Children are sorted by name so discovery order is deterministic
//! - [`Walker::collect_files`] deduplicates by NFC path key, so one file is
//!   never returned twice
//!
//! # Example
//!
//! ```no_run
//! use photosift::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/photos"), WalkerConfig::default());
//! let files = walker.collect_files().unwrap();
//! println!("Found {} images", files.len());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::path_utils::{has_component, has_extension, path_key};
use super::{ScanError, WalkerConfig};

/// Recursive image discovery for one folder.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given folder.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Root folder of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the ignore matcher from configured patterns.
    fn build_ignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a file matches an ignore pattern (itself or a parent dir).
    fn should_ignore(&self, path: &Path, matcher: &Option<Gitignore>) -> bool {
        let Some(gi) = matcher else {
            return false;
        };
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        gi.matched_path_or_any_parents(relative, false).is_ignore()
    }

    /// Check that the root is an existing directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when the folder cannot be enumerated at all.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) => Err(match e.kind() {
                std::io::ErrorKind::NotFound => ScanError::NotFound(self.root.clone()),
                std::io::ErrorKind::PermissionDenied => {
                    ScanError::PermissionDenied(self.root.clone())
                }
                _ => ScanError::Io {
                    path: self.root.clone(),
                    source: e,
                },
            }),
        }
    }

    /// Walk the folder, yielding matching files in name-sorted order.
    ///
    /// Per-entry errors are yielded as [`ScanError`] values rather than
    /// stopping iteration. The same file may appear twice when reachable
    /// through a followed symlink; use [`Walker::collect_files`] for a
    /// deduplicated list.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let matcher = self.build_ignore();
        let trash_name = self.config.trash_dir_name.clone();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Never descend into trash directories
                children.retain(|child| {
                    child.as_ref().map_or(true, |entry| {
                        !(entry.file_type().is_dir() && entry.file_name() == trash_name.as_str())
                    })
                });
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        return None;
                    }
                    let path = entry.path();

                    if has_component(&path, &self.config.trash_dir_name) {
                        log::trace!("Skipping trashed file: {}", path.display());
                        return None;
                    }
                    if !has_extension(&path, &self.config.extensions) {
                        return None;
                    }
                    if self.should_ignore(&path, &matcher) {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }

                    let is_file = if self.config.follow_symlinks {
                        std::fs::metadata(&path).map(|m| m.is_file())
                    } else {
                        Ok(entry.file_type().is_file())
                    };
                    match is_file {
                        Ok(true) => Some(Ok(path)),
                        Ok(false) => None,
                        Err(e) => {
                            log::warn!("Cannot stat {}: {}", path.display(), e);
                            Some(Err(ScanError::Io { path, source: e }))
                        }
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            })
    }

    /// Collect every matching file once, in discovery order.
    ///
    /// Unreadable subdirectories are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] only when the root itself cannot be enumerated.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, ScanError> {
        self.validate_root()?;

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        let mut skipped = 0usize;

        for entry in self.walk() {
            match entry {
                Ok(path) => {
                    if seen.insert(path_key(&path)) {
                        files.push(path);
                    } else {
                        log::debug!("Dropping duplicate path: {}", path.display());
                    }
                }
                Err(_) => skipped += 1,
            }
        }

        log::debug!(
            "Discovered {} files under {} ({} entries unreadable)",
            files.len(),
            self.root.display(),
            skipped
        );
        Ok(files)
    }
}
