//! Scanner module for folder walking and per-image quality scoring.
//!
//! This module provides functionality for:
//! - Recursive image discovery using jwalk (trash directory excluded)
//! - Blur, brightness and resolution metrics via the [`FeatureExtractor`] contract
//! - Parallel batch scoring on a bounded worker pool
//! - Threshold partitioning into flagged / unflagged buckets
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Folder traversal, extension filter and deduplication
//! - [`extractor`]: Scalar image metrics (the feature-extraction boundary)
//! - [`quality`]: User-facing quality categories
//! - [`pool`]: Bounded worker pool with message passing back to the caller
//! - [`batch`]: The [`BatchScanner`] orchestrator and its result types
//!
//! # Example
//!
//! ```no_run
//! use photosift::scanner::{BatchScanner, ImageMetrics, ScanCriterion, ScannerConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let scanner = BatchScanner::new(Arc::new(ImageMetrics::new()), ScannerConfig::default());
//! let result = scanner
//!     .scan(Path::new("/photos"), ScanCriterion::Blur { threshold: 100.0 })
//!     .unwrap();
//!
//! for record in &result.flagged {
//!     println!("{}: {}", record.path.display(), record.label());
//! }
//! ```

pub mod batch;
pub mod extractor;
pub mod path_utils;
pub mod pool;
pub mod quality;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use batch::{
    BatchScanner, ImageRecord, ScanCriterion, ScanKind, ScanResult, ScannerConfig, Score,
};
pub use extractor::{FeatureExtractor, ImageMetrics};
pub use quality::{BlurCategory, BrightnessCategory, ResolutionCategory};
pub use walker::Walker;

/// Extensions scanned by the quality scanners (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Default name of the per-folder trash directory.
pub const DEFAULT_TRASH_DIR: &str = "Trash";

/// Configuration for folder walking.
///
/// Controls which files are discovered and how the tree is traversed.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Lowercase extensions (without the dot) to include.
    pub extensions: Vec<String>,

    /// Name of the reserved trash directory. Any path with a component
    /// equal to this name is excluded.
    pub trash_dir_name: String,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            skip_hidden: false,
            extensions: IMAGE_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            trash_dir_name: DEFAULT_TRASH_DIR.to_string(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl WalkerConfig {
    /// Replace the extension set (used by duplicate detection for generic sets).
    ///
    /// Leading dots are stripped and extensions are lowercased.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Set the trash directory name.
    #[must_use]
    pub fn with_trash_dir_name(mut self, name: impl Into<String>) -> Self {
        self.trash_dir_name = name.into();
        self
    }

    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set gitignore-style ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

/// Errors that abort a whole scan before any image is scored.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing the folder.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while enumerating the folder.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    Pool(String),
}

/// Per-file extraction failure. Never aborts a batch.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// Failed to open or decode the image.
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        /// Image that failed
        path: PathBuf,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// The backend rejected the file for another reason.
    #[error("Extraction failed for {path}: {message}")]
    Backend {
        /// Image that failed
        path: PathBuf,
        /// Backend message
        message: String,
    },
}

impl ExtractError {
    /// Path of the image that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Decode { path, .. } | Self::Backend { path, .. } => path,
        }
    }
}
