//! Cosine similarity and greedy anchor clustering.
//!
//! # Algorithm
//!
//! 1. L2-normalise every vector (`norm + NORM_EPSILON` keeps zero vectors finite)
//! 2. Build the full `n x n` cosine-similarity matrix
//! 3. Visit items in discovery order. An unassigned item `i` becomes an
//!    anchor: every still-unassigned `j` with `sim[i][j] >= threshold` joins
//!    its cluster and is scored with `sim[i][j]`. An anchor with no matches is
//!    marked assigned and produces nothing.
//!
//! Step 3 is greedy and order-dependent. It is not transitive closure: two
//! items that each match the anchor join the same cluster even when they are
//! dissimilar to each other, and an item claimed by an earlier anchor is
//! never reconsidered. Which images end up together depends on this exact
//! policy, so it must stay as is.
//!
//! Memory and time are O(n²); see
//! [`MATRIX_SOFT_LIMIT`](super::grouper::MATRIX_SOFT_LIMIT).

use rayon::prelude::*;

/// Added to every vector norm before dividing.
pub const NORM_EPSILON: f32 = 1e-8;

/// Return `v / (|v| + NORM_EPSILON)`.
#[must_use]
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt() + NORM_EPSILON;
    v.iter().map(|x| x / norm).collect()
}

/// Dense symmetric similarity matrix, row-major.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute pairwise cosine similarity for `vectors`.
    ///
    /// Rows are filled in parallel; each cell depends only on its two inputs,
    /// so the result is identical on every run.
    #[must_use]
    pub fn compute<V: AsRef<[f32]> + Sync>(vectors: &[V]) -> Self {
        let n = vectors.len();
        let normalized: Vec<Vec<f32>> = vectors.iter().map(|v| l2_normalize(v.as_ref())).collect();

        let mut data = vec![0.0f32; n * n];
        if n > 0 {
            data.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                let a = &normalized[i];
                for (j, cell) in row.iter_mut().enumerate() {
                    *cell = dot(a, &normalized[j]);
                }
            });
        }

        Self { n, data }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when the matrix has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity of items `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.n && j < self.n, "index out of bounds");
        self.data[i * self.n + j]
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// One cluster produced by [`group_embeddings`], by item index.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// First-visited item; the "original".
    pub anchor: usize,
    /// Claimed items in index order with their similarity to the anchor.
    pub members: Vec<(usize, f32)>,
}

/// Greedy anchor clustering over a precomputed matrix.
#[must_use]
pub fn cluster_matrix(matrix: &SimilarityMatrix, threshold: f32) -> Vec<Cluster> {
    let n = matrix.len();
    let mut assigned = vec![false; n];
    let mut clusters = Vec::new();

    for i in 0..n {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;

        // Items before i are all assigned already.
        let row = matrix.row(i);
        let members: Vec<(usize, f32)> = (i + 1..n)
            .filter(|&j| !assigned[j] && row[j] >= threshold)
            .map(|j| (j, row[j]))
            .collect();

        if members.is_empty() {
            continue;
        }
        for &(j, _) in &members {
            assigned[j] = true;
        }
        clusters.push(Cluster { anchor: i, members });
    }

    clusters
}

/// Normalise, build the matrix and cluster in one call.
#[must_use]
pub fn group_embeddings<V: AsRef<[f32]> + Sync>(threshold: f32, vectors: &[V]) -> Vec<Cluster> {
    cluster_matrix(&SimilarityMatrix::compute(vectors), threshold)
}
