//! Embedding backends and the shared model handle.
//!
//! The grouper does not care how vectors are produced, only that cosine
//! similarity over them is meaningful. Backends implement
//! [`EmbeddingBackend`] and are reached through a [`ModelHandle`], which
//! loads the backend at most once per process:
//!
//! ```text
//! NotLoaded ──get()──> Ready
//!     │
//!     └──get()──> Failed   (sticky; every later get() returns the same error)
//! ```
//!
//! [`ThumbnailEmbedder`] is the built-in backend: a mean-centred 16x16
//! luminance thumbnail plus the overall mean. It catches re-encodes, resizes
//! and small crops well enough for triage without an external model.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use image::imageops::FilterType;

use crate::scanner::ExtractError;

/// Model initialisation failure. Fatal for duplicate detection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The loader ran and reported an error.
    #[error("Embedding model failed to load: {0}")]
    LoadFailed(String),

    /// No loader was available (already consumed by a panicking load).
    #[error("Embedding model is unavailable")]
    Unavailable,
}

/// Produces fixed-length embedding vectors for images.
///
/// Implementations must tolerate concurrent read-only calls.
pub trait EmbeddingBackend: Send + Sync {
    /// Length of every vector this backend produces.
    fn dimension(&self) -> usize;

    /// Embed a batch of images.
    ///
    /// Returns one entry per input path, in input order. A failed file is an
    /// `Err` in its slot and never fails the other files.
    fn embed_batch(&self, paths: &[PathBuf]) -> Vec<Result<Vec<f32>, ExtractError>>;
}

/// Lifecycle state of a [`ModelHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Loader has not run yet.
    NotLoaded,
    /// Backend is available.
    Ready,
    /// Loading failed; the failure is permanent for this handle.
    Failed,
}

type Loader = Box<dyn FnOnce() -> Result<Arc<dyn EmbeddingBackend>, ModelError> + Send>;

/// Lazily initialised, shared embedding backend.
///
/// Constructed once per session and injected into the grouper.
pub struct ModelHandle {
    loader: Mutex<Option<Loader>>,
    backend: OnceLock<Result<Arc<dyn EmbeddingBackend>, ModelError>>,
}

impl ModelHandle {
    /// Create a handle that runs `loader` on first use.
    pub fn new<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn EmbeddingBackend>, ModelError> + Send + 'static,
    {
        Self {
            loader: Mutex::new(Some(Box::new(loader))),
            backend: OnceLock::new(),
        }
    }

    /// Create a handle around an already constructed backend.
    #[must_use]
    pub fn ready(backend: Arc<dyn EmbeddingBackend>) -> Self {
        let handle = Self {
            loader: Mutex::new(None),
            backend: OnceLock::new(),
        };
        let _ = handle.backend.set(Ok(backend));
        handle
    }

    /// Handle for the built-in [`ThumbnailEmbedder`], loaded lazily.
    #[must_use]
    pub fn thumbnail() -> Self {
        Self::new(|| Ok(Arc::new(ThumbnailEmbedder::default()) as Arc<dyn EmbeddingBackend>))
    }

    /// Current lifecycle state. Never triggers loading.
    #[must_use]
    pub fn state(&self) -> ModelState {
        match self.backend.get() {
            None => ModelState::NotLoaded,
            Some(Ok(_)) => ModelState::Ready,
            Some(Err(_)) => ModelState::Failed,
        }
    }

    /// Get the backend, loading it on first call.
    ///
    /// Concurrent first calls block until the single load finishes.
    ///
    /// # Errors
    ///
    /// Returns the (sticky) [`ModelError`] if loading failed.
    pub fn get(&self) -> Result<Arc<dyn EmbeddingBackend>, ModelError> {
        self.backend
            .get_or_init(|| {
                let loader = self.loader.lock().ok().and_then(|mut slot| slot.take());
                match loader {
                    Some(load) => {
                        log::info!("Loading embedding model");
                        let result = load();
                        match &result {
                            Ok(backend) => {
                                log::debug!("Embedding model ready ({} dims)", backend.dimension());
                            }
                            Err(e) => log::error!("{}", e),
                        }
                        result
                    }
                    None => Err(ModelError::Unavailable),
                }
            })
            .clone()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Default thumbnail edge length.
pub const THUMBNAIL_SIZE: u32 = 16;

/// Built-in embedding: downscaled grayscale thumbnail.
///
/// Vector layout: `size * size` mean-centred luminance values in `[-1, 1]`
/// followed by the mean luminance in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailEmbedder {
    size: u32,
}

impl Default for ThumbnailEmbedder {
    fn default() -> Self {
        Self {
            size: THUMBNAIL_SIZE,
        }
    }
}

impl ThumbnailEmbedder {
    /// Create an embedder with a custom thumbnail edge (minimum 2).
    #[must_use]
    pub fn with_size(size: u32) -> Self {
        Self { size: size.max(2) }
    }

    /// Embed a decoded image.
    #[must_use]
    pub fn embed_image(&self, image: &image::DynamicImage) -> Vec<f32> {
        let thumb = image
            .resize_exact(self.size, self.size, FilterType::Triangle)
            .to_luma8();
        let values: Vec<f32> = thumb.pixels().map(|p| f32::from(p[0]) / 255.0).collect();
        let mean = values.iter().sum::<f32>() / values.len() as f32;

        let mut vector: Vec<f32> = values.iter().map(|v| v - mean).collect();
        vector.push(mean);
        vector
    }

    fn embed_path(&self, path: &Path) -> Result<Vec<f32>, ExtractError> {
        let image = image::open(path).map_err(|source| ExtractError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.embed_image(&image))
    }
}

impl EmbeddingBackend for ThumbnailEmbedder {
    fn dimension(&self) -> usize {
        (self.size * self.size) as usize + 1
    }

    fn embed_batch(&self, paths: &[PathBuf]) -> Vec<Result<Vec<f32>, ExtractError>> {
        paths.iter().map(|p| self.embed_path(p)).collect()
    }
}
