//! In-memory triage session.
//!
//! [`TriageSession`] is the single owner of everything derived from one
//! folder: the last [`ScanResult`] of each scan kind, the
//! [`EmbeddingStore`] and the current [`Grouping`]. Nothing is written to
//! disk apart from the trash directory itself.
//!
//! Invalidation rules:
//! - [`TriageSession::set_folder`] drops every result and the embeddings
//! - [`TriageSession::apply_trash`] prunes the moved paths from every scan
//!   result and from the grouping (groups left with one member disappear)
//!   and clears the embeddings
//! - [`TriageSession::restore`] drops every result, since restored files
//!   have not been scored
//!
//! A new scan of a kind replaces the previous result of that kind wholesale.

use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::actions::{TrashError, TrashManager, TrashOperationResult};
use crate::duplicates::{
    DuplicateGrouper, EmbeddingStore, GroupError, GrouperConfig, Grouping, ModelHandle,
};
use crate::scanner::{
    BatchScanner, FeatureExtractor, ImageMetrics, ScanCriterion, ScanError, ScanKind, ScanResult,
    ScannerConfig, Walker,
};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No folder has been selected.
    #[error("no folder selected")]
    NoFolder,

    /// Regrouping was requested before any duplicate scan.
    #[error("no embeddings available; run a duplicate scan first")]
    NoEmbeddings,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error(transparent)]
    Trash(#[from] TrashError),
}

/// State of one triage session over one folder.
pub struct TriageSession {
    folder: Option<PathBuf>,
    scanner: BatchScanner,
    grouper: DuplicateGrouper,
    trash: TrashManager,
    results: HashMap<ScanKind, ScanResult>,
    files: Vec<PathBuf>,
    embeddings: EmbeddingStore,
    embedded: bool,
    grouping: Option<Grouping>,
}

impl TriageSession {
    /// Create a session from its collaborators.
    #[must_use]
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        model: Arc<ModelHandle>,
        scanner_config: ScannerConfig,
        grouper_config: GrouperConfig,
        trash: TrashManager,
    ) -> Self {
        Self {
            folder: None,
            scanner: BatchScanner::new(extractor, scanner_config),
            grouper: DuplicateGrouper::new(model, grouper_config),
            trash,
            results: HashMap::new(),
            files: Vec::new(),
            embeddings: EmbeddingStore::new(),
            embedded: false,
            grouping: None,
        }
    }

    /// Session with the built-in metrics and thumbnail embedder.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(ImageMetrics::new()),
            Arc::new(ModelHandle::thumbnail()),
            ScannerConfig::default(),
            GrouperConfig::default(),
            TrashManager::default(),
        )
    }

    /// Select a folder, discarding all state derived from the previous one.
    pub fn set_folder(&mut self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        log::debug!("Session folder set to {}", folder.display());
        self.folder = Some(folder);
        self.invalidate();
    }

    /// Currently selected folder.
    #[must_use]
    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    fn require_folder(&self) -> Result<PathBuf, SessionError> {
        self.folder.clone().ok_or(SessionError::NoFolder)
    }

    fn invalidate(&mut self) {
        self.results.clear();
        self.files.clear();
        self.embeddings.clear();
        self.embedded = false;
        self.grouping = None;
    }

    /// Run a quality scan and keep its result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoFolder`] or the scan's setup error.
    pub fn run_scan(&mut self, criterion: ScanCriterion) -> Result<&ScanResult, SessionError> {
        let folder = self.require_folder()?;
        let result = self.scanner.scan(&folder, criterion)?;
        let kind = result.kind;
        self.results.insert(kind, result);
        Ok(&self.results[&kind])
    }

    /// Last result of a scan kind.
    #[must_use]
    pub fn result(&self, kind: ScanKind) -> Option<&ScanResult> {
        self.results.get(&kind)
    }

    /// Embed the folder (if not cached) and group at `threshold`.
    ///
    /// A folder with no embeddable images yields an empty grouping.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoFolder`], or a walk/model error.
    pub fn find_duplicates(&mut self, threshold: f32) -> Result<&Grouping, SessionError> {
        let folder = self.require_folder()?;
        if !self.embedded {
            let files =
                Walker::new(&folder, self.grouper.config().walker.clone()).collect_files()?;
            self.embeddings = self.grouper.embed_batch(&files)?;
            self.files = files;
            self.embedded = true;
        }
        self.regroup(threshold)
    }

    /// Regroup cached embeddings at a new threshold. No I/O.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoEmbeddings`] if no duplicate scan has run
    /// since the last invalidation.
    pub fn regroup(&mut self, threshold: f32) -> Result<&Grouping, SessionError> {
        if !self.embedded {
            return Err(SessionError::NoEmbeddings);
        }
        let grouping = self.grouper.group(threshold, &self.embeddings, &self.files);
        Ok(self.grouping.insert(grouping))
    }

    /// Current duplicate grouping.
    #[must_use]
    pub fn grouping(&self) -> Option<&Grouping> {
        self.grouping.as_ref()
    }

    /// Cached embeddings.
    #[must_use]
    pub fn embeddings(&self) -> &EmbeddingStore {
        &self.embeddings
    }

    /// Move `paths` to the trash and prune them from every result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoFolder`] or the manager's setup error.
    pub fn apply_trash(&mut self, paths: &[PathBuf]) -> Result<TrashOperationResult, SessionError> {
        let folder = self.require_folder()?;
        let outcome = self.trash.move_to_trash(paths, &folder)?;

        let removed: HashSet<PathBuf> = outcome.moved_sources().into_iter().collect();
        if !removed.is_empty() {
            for result in self.results.values_mut() {
                *result = result.without_paths(&removed);
            }
            if let Some(grouping) = self.grouping.as_mut() {
                *grouping = grouping.without_paths(&removed);
            }
            self.embeddings.clear();
            self.files.clear();
            self.embedded = false;
        }

        Ok(outcome)
    }

    /// Restore named files from the trash. Drops all results.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoFolder`] or the manager's setup error.
    pub fn restore<S: AsRef<OsStr>>(
        &mut self,
        names: &[S],
    ) -> Result<TrashOperationResult, SessionError> {
        let folder = self.require_folder()?;
        let outcome = self.trash.restore(names, &folder)?;
        if outcome.moved_count > 0 {
            self.invalidate();
        }
        Ok(outcome)
    }

    /// Number of files in the current folder's trash.
    #[must_use]
    pub fn trashed_count(&self) -> usize {
        self.folder
            .as_deref()
            .map_or(0, |f| self.trash.trashed_count(f))
    }
}
