//! Batch quality scanning.
//!
//! # Overview
//!
//! [`BatchScanner`] is shared by the blur, darkness and low-resolution
//! scanners; only the [`ScanCriterion`] differs. A scan runs:
//!
//! 1. **Walk** - collect supported images under the folder (trash excluded)
//! 2. **Score** - one extraction per file on a bounded worker pool; results
//!    flow back over a channel and progress fires in completion order
//! 3. **Partition** - records are restored to discovery order, split by the
//!    criterion's predicate and sorted (flagged worst first, unflagged best
//!    first; stable, so ties keep discovery order)
//!
//! A file whose extraction fails lands in neither bucket and is not counted
//! in `total_processed`; it is listed in [`ScanResult::failed`].
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
//!     .scan(Path::new("/photos"), ScanCriterion::Brightness { threshold: 40.0 })
//!     .unwrap();
//! println!("{} of {} images are dark", result.total_flagged, result.total_processed);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::extractor::FeatureExtractor;
use super::path_utils::file_name_lossy;
use super::pool::{build_pool, dispatch, effective_workers};
use super::quality::{BlurCategory, BrightnessCategory, ResolutionCategory};
use super::walker::Walker;
use super::{ExtractError, ScanError, WalkerConfig};
use crate::progress::{phase, ProgressCallback};

/// Which metric a scan measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    /// Laplacian-variance sharpness.
    Blur,
    /// Mean HSV value.
    Brightness,
    /// Pixel dimensions.
    Resolution,
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blur => write!(f, "blur"),
            Self::Brightness => write!(f, "brightness"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Metric and threshold for one scan. Thresholds are runtime parameters only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanCriterion {
    /// Flag when the blur score is below `threshold`.
    Blur { threshold: f64 },
    /// Flag when the brightness score is below `threshold`.
    Brightness { threshold: f64 },
    /// Flag when `width < min_width` or `height < min_height`.
    Resolution { min_width: u32, min_height: u32 },
}

impl ScanCriterion {
    /// The metric this criterion measures.
    #[must_use]
    pub fn kind(&self) -> ScanKind {
        match self {
            Self::Blur { .. } => ScanKind::Blur,
            Self::Brightness { .. } => ScanKind::Brightness,
            Self::Resolution { .. } => ScanKind::Resolution,
        }
    }

    /// Run the matching extractor call for one file.
    ///
    /// # Errors
    ///
    /// Propagates the extractor's per-file error.
    pub fn measure(
        &self,
        extractor: &dyn FeatureExtractor,
        path: &Path,
    ) -> Result<Score, ExtractError> {
        match self {
            Self::Blur { .. } => extractor.blur_score(path).map(Score::Value),
            Self::Brightness { .. } => extractor.brightness_score(path).map(Score::Value),
            Self::Resolution { .. } => extractor
                .dimensions(path)
                .map(|(width, height)| Score::Dimensions { width, height }),
        }
    }

    /// Partition predicate.
    #[must_use]
    pub fn is_flagged(&self, score: &Score) -> bool {
        match (self, score) {
            (Self::Blur { threshold } | Self::Brightness { threshold }, Score::Value(v)) => {
                *v < *threshold
            }
            (
                Self::Resolution {
                    min_width,
                    min_height,
                },
                Score::Dimensions { width, height },
            ) => width < min_width || height < min_height,
            // Mismatched shapes only arise from a broken extractor.
            _ => false,
        }
    }
}

/// A measured value for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Score {
    /// Scalar metric (blur or brightness).
    Value(f64),
    /// Pixel dimensions.
    Dimensions { width: u32, height: u32 },
}

impl Score {
    /// Key used for bucket ordering: the value itself, or the shorter side.
    #[must_use]
    pub fn sort_key(&self) -> f64 {
        match self {
            Self::Value(v) => *v,
            Self::Dimensions { width, height } => f64::from((*width).min(*height)),
        }
    }
}

/// One scored image. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    /// Image path
    pub path: PathBuf,
    /// Measured value
    pub score: Score,
    /// Whether the image fell below the threshold
    pub flagged: bool,
    /// Metric that produced the score
    pub kind: ScanKind,
}

impl ImageRecord {
    /// Quality category label for display.
    #[must_use]
    pub fn label(&self) -> String {
        match (self.kind, self.score) {
            (ScanKind::Blur, Score::Value(v)) => BlurCategory::from_score(v).to_string(),
            (ScanKind::Brightness, Score::Value(v)) => {
                BrightnessCategory::from_score(v).to_string()
            }
            (ScanKind::Resolution, Score::Dimensions { width, height }) => {
                ResolutionCategory::from_dimensions(width, height).to_string()
            }
            _ => "Unknown".to_string(),
        }
    }
}

/// Outcome of one scan. Superseded wholesale by the next scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Metric of this scan
    pub kind: ScanKind,
    /// Images below threshold, worst first
    pub flagged: Vec<ImageRecord>,
    /// Images at or above threshold, best first
    pub unflagged: Vec<ImageRecord>,
    /// Files discovered by the walk
    pub total_found: usize,
    /// Files successfully scored (`flagged.len() + unflagged.len()`)
    pub total_processed: usize,
    /// Number of flagged images
    pub total_flagged: usize,
    /// Files whose extraction failed
    pub failed: Vec<PathBuf>,
}

impl ScanResult {
    /// Empty result for `kind`.
    #[must_use]
    pub fn empty(kind: ScanKind) -> Self {
        Self {
            kind,
            flagged: Vec::new(),
            unflagged: Vec::new(),
            total_found: 0,
            total_processed: 0,
            total_flagged: 0,
            failed: Vec::new(),
        }
    }

    /// Build a result from records in discovery order.
    #[must_use]
    pub fn from_records(
        kind: ScanKind,
        records: Vec<ImageRecord>,
        failed: Vec<PathBuf>,
        total_found: usize,
    ) -> Self {
        let (mut flagged, mut unflagged): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.flagged);

        // Stable sorts keep discovery order among equal scores.
        flagged.sort_by(|a, b| a.score.sort_key().total_cmp(&b.score.sort_key()));
        unflagged.sort_by(|a, b| b.score.sort_key().total_cmp(&a.score.sort_key()));

        Self {
            kind,
            total_processed: flagged.len() + unflagged.len(),
            total_flagged: flagged.len(),
            flagged,
            unflagged,
            total_found,
            failed,
        }
    }

    /// Copy of this result with `removed` paths taken out of every list.
    ///
    /// Used after files were moved to the trash.
    #[must_use]
    pub fn without_paths(&self, removed: &HashSet<PathBuf>) -> Self {
        let keep = |r: &&ImageRecord| !removed.contains(&r.path);
        let flagged: Vec<_> = self.flagged.iter().filter(keep).cloned().collect();
        let unflagged: Vec<_> = self.unflagged.iter().filter(keep).cloned().collect();
        let failed: Vec<_> = self
            .failed
            .iter()
            .filter(|p| !removed.contains(*p))
            .cloned()
            .collect();
        let dropped = self.total_processed - flagged.len() - unflagged.len()
            + (self.failed.len() - failed.len());

        Self {
            kind: self.kind,
            total_processed: flagged.len() + unflagged.len(),
            total_flagged: flagged.len(),
            flagged,
            unflagged,
            total_found: self.total_found.saturating_sub(dropped),
            failed,
        }
    }

    /// Paths of all flagged images, worst first.
    #[must_use]
    pub fn flagged_paths(&self) -> Vec<PathBuf> {
        self.flagged.iter().map(|r| r.path.clone()).collect()
    }
}

/// Configuration for the batch scanner.
#[derive(Clone, Default)]
pub struct ScannerConfig {
    /// Requested worker count; always capped by available parallelism and 8.
    pub max_workers: Option<usize>,
    /// Folder walk configuration.
    pub walker: WalkerConfig,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("max_workers", &self.max_workers)
            .field("walker", &self.walker)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ScannerConfig {
    /// Set the requested worker count.
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker = config;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Parallel quality scanner.
pub struct BatchScanner {
    extractor: Arc<dyn FeatureExtractor>,
    config: ScannerConfig,
}

impl BatchScanner {
    /// Create a scanner around a shared extractor.
    #[must_use]
    pub fn new(extractor: Arc<dyn FeatureExtractor>, config: ScannerConfig) -> Self {
        Self { extractor, config }
    }

    /// Scanner configuration.
    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Walk `folder` and score every supported image.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] when the folder cannot be enumerated or the
    /// worker pool cannot start. Per-file failures never error.
    pub fn scan(&self, folder: &Path, criterion: ScanCriterion) -> Result<ScanResult, ScanError> {
        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(phase::WALK, 0);
        }
        let files = Walker::new(folder, self.config.walker.clone()).collect_files()?;
        if let Some(cb) = progress {
            cb.on_phase_end(phase::WALK);
        }

        log::info!(
            "Scanning {} images in {} for {}",
            files.len(),
            folder.display(),
            criterion.kind()
        );
        self.scan_files(files, criterion)
    }

    /// Score an explicit file list (already deduplicated, in discovery order).
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Pool`] if the worker pool cannot start.
    pub fn scan_files(
        &self,
        files: Vec<PathBuf>,
        criterion: ScanCriterion,
    ) -> Result<ScanResult, ScanError> {
        let total = files.len();
        let kind = criterion.kind();
        if total == 0 {
            log::debug!("No images to score");
            return Ok(ScanResult::empty(kind));
        }

        let workers = effective_workers(self.config.max_workers);
        let pool = build_pool(workers, "photosift-score")?;
        log::debug!("Scoring {} files on {} workers", total, workers);

        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(phase::SCORE, total);
        }

        let extractor = Arc::clone(&self.extractor);
        let rx = dispatch(&pool, files.clone(), move |path: PathBuf| {
            criterion.measure(extractor.as_ref(), &path)
        });

        let mut scores: Vec<Option<Score>> = vec![None; total];
        let mut failed_idx = Vec::new();

        for (done, (index, outcome)) in rx.iter().enumerate() {
            let path = &files[index];
            let outcome = outcome.unwrap_or_else(|message| {
                Err(ExtractError::Backend {
                    path: path.clone(),
                    message: format!("extractor panicked: {message}"),
                })
            });
            match outcome {
                Ok(score) => {
                    log::trace!("Scored {}: {:?}", path.display(), score);
                    scores[index] = Some(score);
                }
                Err(e) => {
                    log::warn!("Skipping unreadable image: {}", e);
                    failed_idx.push(index);
                }
            }
            if let Some(cb) = progress {
                cb.on_progress(done + 1, total, &file_name_lossy(path));
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end(phase::SCORE);
        }

        failed_idx.sort_unstable();
        let failed: Vec<PathBuf> = failed_idx.iter().map(|&i| files[i].clone()).collect();
        let records: Vec<ImageRecord> = files
            .into_iter()
            .zip(scores)
            .filter_map(|(path, score)| {
                score.map(|score| ImageRecord {
                    flagged: criterion.is_flagged(&score),
                    path,
                    score,
                    kind,
                })
            })
            .collect();

        let result = ScanResult::from_records(kind, records, failed, total);
        log::info!(
            "{} scan complete: {} processed, {} flagged, {} failed",
            kind,
            result.total_processed,
            result.total_flagged,
            result.failed.len()
        );
        Ok(result)
    }
}

/// Whether `records` are sorted by score key (ascending or descending).
#[must_use]
pub fn is_sorted_by_key(records: &[ImageRecord], ascending: bool) -> bool {
    records.windows(2).all(|w| {
        let ord = w[0].score.sort_key().total_cmp(&w[1].score.sort_key());
        if ascending {
            ord != Ordering::Greater
        } else {
            ord != Ordering::Less
        }
    })
}
