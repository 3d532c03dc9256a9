//! Duplicate detection orchestrator.
//!
//! # Overview
//!
//! [`DuplicateGrouper`] runs the duplicate pipeline:
//!
//! 1. **Walk** - collect candidate images (caller-supplied extension set)
//! 2. **Embed** - split the file list into fixed-size chunks and embed each
//!    chunk on the worker pool; progress advances per chunk
//! 3. **Group** - cosine-similarity matrix and greedy anchor clustering
//!
//! Step 3 only needs the [`EmbeddingStore`] and the discovery-ordered file
//! list, so changing the threshold calls [`DuplicateGrouper::group`] again
//! without touching the disk or the model.
//!
//! # Scaling
//!
//! The similarity matrix is dense: `n²` `f32` cells. Beyond
//! [`MATRIX_SOFT_LIMIT`] images a warning is logged and grouping proceeds.
//!
//! # Example
//!
//! ```no_run
//! use photosift::duplicates::{DuplicateGrouper, GrouperConfig, ModelHandle};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let grouper = DuplicateGrouper::new(Arc::new(ModelHandle::thumbnail()), GrouperConfig::default());
//! let (store, grouping) = grouper.scan(Path::new("/photos")).unwrap();
//!
//! // Tighten without recomputing embeddings
//! let files = store.paths().to_vec();
//! let strict = grouper.group(0.99, &store, &files);
//! assert!(strict.duplicate_count() <= grouping.duplicate_count());
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::embedding::{ModelError, ModelHandle};
use super::groups::{DuplicateGroup, Grouping};
use super::similarity::group_embeddings;
use crate::progress::{phase, ProgressCallback};
use crate::scanner::path_utils::file_name_lossy;
use crate::scanner::pool::{build_pool, dispatch, effective_workers};
use crate::scanner::{ExtractError, ScanError, Walker, WalkerConfig};

/// Image count above which a warning about matrix size is logged.
pub const MATRIX_SOFT_LIMIT: usize = 4000;

/// Default number of images per embedding call.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Default cosine-similarity threshold.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.95;

/// Errors that abort duplicate detection.
#[derive(thiserror::Error, Debug)]
pub enum GroupError {
    /// The embedding model could not be loaded.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The folder could not be enumerated or the pool failed to start.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Embeddings from one duplicate scan, keyed by path.
///
/// Keeps the order files were embedded in. Owned by the session; cleared on
/// folder change or after a trash operation.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStore {
    order: Vec<PathBuf>,
    vectors: HashMap<PathBuf, Vec<f32>>,
}

impl EmbeddingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a vector.
    pub fn insert(&mut self, path: PathBuf, vector: Vec<f32>) {
        if !self.vectors.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.vectors.insert(path, vector);
    }

    /// Vector for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&[f32]> {
        self.vectors.get(path).map(Vec::as_slice)
    }

    /// Whether `path` has a vector.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.vectors.contains_key(path)
    }

    /// Paths in insertion order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.order
    }

    /// Number of stored vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no vectors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every vector.
    pub fn clear(&mut self) {
        self.order.clear();
        self.vectors.clear();
    }

    /// Drop the vectors of `removed` paths.
    pub fn remove_paths(&mut self, removed: &HashSet<PathBuf>) {
        self.order.retain(|p| !removed.contains(p));
        self.vectors.retain(|p, _| !removed.contains(p));
    }
}

/// Configuration for the duplicate grouper.
#[derive(Clone)]
pub struct GrouperConfig {
    /// Images per embedding call.
    pub batch_size: usize,
    /// Requested worker count; capped like the batch scanner.
    pub max_workers: Option<usize>,
    /// Threshold used by [`DuplicateGrouper::scan`].
    pub threshold: f32,
    /// Folder walk configuration (extension set may differ from the scanners).
    pub walker: WalkerConfig,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
            max_workers: None,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            walker: WalkerConfig::default(),
            progress_callback: None,
        }
    }
}

impl std::fmt::Debug for GrouperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrouperConfig")
            .field("batch_size", &self.batch_size)
            .field("max_workers", &self.max_workers)
            .field("threshold", &self.threshold)
            .field("walker", &self.walker)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl GrouperConfig {
    /// Set the embedding batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the requested worker count.
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Set the similarity threshold used by `scan`.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
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

/// Embedding-based near-duplicate detector.
pub struct DuplicateGrouper {
    model: Arc<ModelHandle>,
    config: GrouperConfig,
}

impl DuplicateGrouper {
    /// Create a grouper around a shared model handle.
    #[must_use]
    pub fn new(model: Arc<ModelHandle>, config: GrouperConfig) -> Self {
        Self { model, config }
    }

    /// Grouper configuration.
    #[must_use]
    pub fn config(&self) -> &GrouperConfig {
        &self.config
    }

    /// Walk `folder`, embed every candidate and group at the configured threshold.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] if the folder cannot be walked or the model
    /// fails to load.
    pub fn scan(&self, folder: &Path) -> Result<(EmbeddingStore, Grouping), GroupError> {
        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(phase::WALK, 0);
        }
        let files = Walker::new(folder, self.config.walker.clone()).collect_files()?;
        if let Some(cb) = progress {
            cb.on_phase_end(phase::WALK);
        }

        log::info!(
            "Looking for duplicates among {} images in {}",
            files.len(),
            folder.display()
        );

        let store = self.embed_batch(&files)?;
        let grouping = self.group(self.config.threshold, &store, &files);
        Ok((store, grouping))
    }

    /// Embed `paths` in fixed-size chunks on the worker pool.
    ///
    /// Files the backend fails on, or whose vector length differs from the
    /// first successful one, are logged and left out of the store.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::Model`] if the backend is unavailable and
    /// [`GroupError::Scan`] if the pool cannot start.
    pub fn embed_batch(&self, paths: &[PathBuf]) -> Result<EmbeddingStore, GroupError> {
        let backend = self.model.get()?;
        let total = paths.len();
        if total == 0 {
            return Ok(EmbeddingStore::new());
        }

        let batch_size = self.config.batch_size.max(1);
        let chunks: Vec<Vec<PathBuf>> = paths.chunks(batch_size).map(<[PathBuf]>::to_vec).collect();
        let chunk_count = chunks.len();

        let workers = effective_workers(self.config.max_workers);
        let pool = build_pool(workers, "photosift-embed")?;
        log::debug!(
            "Embedding {} files in {} batches of up to {} on {} workers",
            total,
            chunk_count,
            batch_size,
            workers
        );

        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(phase::EMBED, total);
        }

        let job_backend = Arc::clone(&backend);
        let rx = dispatch(&pool, chunks.clone(), move |chunk: Vec<PathBuf>| {
            job_backend.embed_batch(&chunk)
        });

        let mut finished: Vec<Vec<Result<Vec<f32>, ExtractError>>> =
            (0..chunk_count).map(|_| Vec::new()).collect();
        let mut done = 0;
        for (index, output) in rx {
            let chunk = &chunks[index];
            done += chunk.len();
            if let Some(cb) = progress {
                let last = chunk.last().map(|p| file_name_lossy(p)).unwrap_or_default();
                cb.on_progress(done, total, &last);
            }
            finished[index] = output.unwrap_or_else(|message| {
                chunk
                    .iter()
                    .map(|path| {
                        Err(ExtractError::Backend {
                            path: path.clone(),
                            message: format!("embedding backend panicked: {message}"),
                        })
                    })
                    .collect()
            });
        }

        if let Some(cb) = progress {
            cb.on_phase_end(phase::EMBED);
        }

        let mut store = EmbeddingStore::new();
        let mut dimension = None;
        let mut failed = 0usize;

        for (chunk, vectors) in chunks.into_iter().zip(finished) {
            if vectors.len() != chunk.len() {
                log::warn!(
                    "Embedding backend returned {} vectors for {} files",
                    vectors.len(),
                    chunk.len()
                );
            }
            let mut vectors = vectors.into_iter();
            for path in chunk {
                match vectors.next() {
                    Some(Ok(vector)) => {
                        let expected = *dimension.get_or_insert(vector.len());
                        if vector.len() == expected {
                            store.insert(path, vector);
                        } else {
                            log::warn!(
                                "Dropping embedding for {}: {} dims, expected {}",
                                path.display(),
                                vector.len(),
                                expected
                            );
                            failed += 1;
                        }
                    }
                    Some(Err(e)) => {
                        log::warn!("Skipping image without embedding: {}", e);
                        failed += 1;
                    }
                    None => {
                        log::warn!("No embedding returned for {}", path.display());
                        failed += 1;
                    }
                }
            }
        }

        log::info!("Embedded {} images ({} failed)", store.len(), failed);
        Ok(store)
    }

    /// Group the embedded subset of `files` at `threshold`.
    ///
    /// `files` defines discovery order; repeated paths count once and paths
    /// with no vector in `embeddings` are skipped. Pure computation: no I/O, no model calls.
    #[must_use]
    pub fn group(&self, threshold: f32, embeddings: &EmbeddingStore, files: &[PathBuf]) -> Grouping {
        let mut seen = HashSet::new();
        let present: Vec<(&PathBuf, &[f32])> = files
            .iter()
            .filter(|p| seen.insert(*p))
            .filter_map(|p| embeddings.get(p).map(|v| (p, v)))
            .collect();
        let n = present.len();

        if n > MATRIX_SOFT_LIMIT {
            log::warn!(
                "Grouping {} images needs a {}x{} similarity matrix (~{} MB); \
                 expect high memory use above {} images",
                n,
                n,
                n,
                n * n * std::mem::size_of::<f32>() / (1024 * 1024),
                MATRIX_SOFT_LIMIT
            );
        }

        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_phase_start(phase::GROUP, 0);
        }

        let vectors: Vec<&[f32]> = present.iter().map(|(_, v)| *v).collect();
        let clusters = group_embeddings(threshold, &vectors);

        let mut groups = Vec::with_capacity(clusters.len());
        let mut scores = HashMap::new();
        for cluster in clusters {
            let anchor = present[cluster.anchor].0.clone();
            scores.insert(anchor.clone(), 1.0);

            let mut members = Vec::with_capacity(cluster.members.len() + 1);
            members.push(anchor);
            for (j, score) in cluster.members {
                let path = present[j].0.clone();
                scores.insert(path.clone(), score);
                members.push(path);
            }
            groups.push(DuplicateGroup::new(members));
        }

        if let Some(cb) = progress {
            cb.on_phase_end(phase::GROUP);
        }

        let grouping = Grouping::new(threshold, groups, scores);
        log::info!(
            "Found {} duplicate groups ({} duplicates) at threshold {:.3}",
            grouping.groups.len(),
            grouping.duplicate_count(),
            threshold
        );
        grouping
    }
}
