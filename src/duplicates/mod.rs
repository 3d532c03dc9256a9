//! Near-duplicate detection.
//!
//! This module provides functionality for:
//! - Lazily loaded embedding backends ([`ModelHandle`], [`ThumbnailEmbedder`])
//! - Chunked, parallel embedding extraction into an [`EmbeddingStore`]
//! - Cosine-similarity matrix and greedy anchor clustering
//! - Re-grouping at a new threshold from cached embeddings
//! - Pruning trashed paths from existing groups

pub mod embedding;
pub mod grouper;
pub mod groups;
pub mod similarity;

pub use embedding::{EmbeddingBackend, ModelError, ModelHandle, ModelState, ThumbnailEmbedder};
pub use grouper::{
    DuplicateGrouper, EmbeddingStore, GroupError, GrouperConfig, DEFAULT_EMBED_BATCH_SIZE,
    DEFAULT_SIMILARITY_THRESHOLD, MATRIX_SOFT_LIMIT,
};
pub use groups::{DuplicateGroup, Grouping};
pub use similarity::{group_embeddings, Cluster, SimilarityMatrix};
