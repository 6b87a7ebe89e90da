//! Grouping of article embeddings into topical clusters.
//!
//! [`SimilarityClusterer`] owns the policy (how many groups, when not to
//! cluster at all, what counts as a usable labelling) while the actual
//! partitioning is delegated to a [`VectorPartitioner`]. The default
//! partitioner is a deterministic k-means.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("cannot cluster an empty set of vectors")]
    EmptyInput,

    #[error("vectors must have at least one dimension")]
    ZeroDimension,

    #[error("vector {index} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("vector {index} has a non-finite component")]
    NonFinite { index: usize },

    #[error("k must be between 1 and {n}, got {k}")]
    InvalidK { k: usize, n: usize },

    #[error("invalid labels: {0}")]
    InvalidLabels(String),

    #[error("partitioning failed: {0}")]
    Failed(String),
}

/// Splits `vectors` into `k` groups, returning one label in `[0, k)` per vector.
pub trait VectorPartitioner: Send + Sync {
    fn partition(&self, vectors: &[Vec<f32>], k: usize) -> Result<Vec<usize>, ClusterError>;
}

/// Lloyd's k-means over squared Euclidean distance.
///
/// Seeding is deterministic: the first vector is the first centroid and each
/// further centroid is the vector farthest from the centroids chosen so far.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub max_iterations: usize,
    pub tolerance: f32,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(vector, centroid);
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

fn validate(vectors: &[Vec<f32>], k: usize) -> Result<(), ClusterError> {
    let first = vectors.first().ok_or(ClusterError::EmptyInput)?;
    let expected = first.len();
    if expected == 0 {
        return Err(ClusterError::ZeroDimension);
    }

    for (index, vector) in vectors.iter().enumerate() {
        if vector.len() != expected {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected,
                found: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(ClusterError::NonFinite { index });
        }
    }

    if k == 0 || k > vectors.len() {
        return Err(ClusterError::InvalidK { k, n: vectors.len() });
    }
    Ok(())
}

fn seed_centroids(vectors: &[Vec<f32>], k: usize) -> Vec<Vec<f32>> {
    let mut chosen = vec![false; vectors.len()];
    let mut min_distances = vec![f32::INFINITY; vectors.len()];
    let mut centroids = Vec::with_capacity(k);

    chosen[0] = true;
    centroids.push(vectors[0].clone());

    while centroids.len() < k {
        if let Some(last) = centroids.last() {
            for (i, vector) in vectors.iter().enumerate() {
                min_distances[i] = min_distances[i].min(squared_distance(vector, last));
            }
        }

        // Farthest unchosen vector; with only duplicates left this is the first unchosen one
        let mut next = None;
        for (i, distance) in min_distances.iter().enumerate() {
            if chosen[i] {
                continue;
            }
            match next {
                Some((_, best)) if *distance <= best => {}
                _ => next = Some((i, *distance)),
            }
        }

        match next {
            Some((i, _)) => {
                chosen[i] = true;
                centroids.push(vectors[i].clone());
            }
            None => break,
        }
    }

    centroids
}

fn recompute_centroids(vectors: &[Vec<f32>], labels: &[usize], previous: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let dimension = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f32; dimension]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (vector, &label) in vectors.iter().zip(labels) {
        counts[label] += 1;
        for (sum, x) in sums[label].iter_mut().zip(vector) {
            *sum += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                // an empty cluster keeps its centroid
                old.clone()
            } else {
                sum.into_iter().map(|x| x / count as f32).collect()
            }
        })
        .collect()
}

impl VectorPartitioner for KMeans {
    fn partition(&self, vectors: &[Vec<f32>], k: usize) -> Result<Vec<usize>, ClusterError> {
        validate(vectors, k)?;

        let mut centroids = seed_centroids(vectors, k);
        let mut labels: Vec<usize> = vectors.iter().map(|v| nearest(v, &centroids)).collect();

        for _ in 0..self.max_iterations {
            let updated = recompute_centroids(vectors, &labels, &centroids);
            let movement = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new).sqrt())
                .fold(0.0f32, f32::max);

            centroids = updated;
            labels = vectors.iter().map(|v| nearest(v, &centroids)).collect();

            if movement < self.tolerance {
                break;
            }
        }

        Ok(labels)
    }
}

/// Number of groups actually requested from the partitioner for `n` vectors,
/// so that a group averages at least two members.
pub fn effective_k(n: usize, k: usize) -> usize {
    k.min(n / 2)
}

/// Everything in one group.
pub fn single_group(n: usize) -> Vec<usize> {
    vec![0; n]
}

/// Distributes `items` into `groups` buckets following `labels`, keeping input order.
pub fn scatter<T>(items: impl IntoIterator<Item = T>, labels: &[usize], groups: usize) -> Vec<Vec<T>> {
    let mut buckets: Vec<Vec<T>> = (0..groups.max(1)).map(|_| Vec::new()).collect();
    for (item, &label) in items.into_iter().zip(labels) {
        if let Some(bucket) = buckets.get_mut(label) {
            bucket.push(item);
        }
    }
    buckets
}

#[derive(Clone)]
pub struct SimilarityClusterer {
    partitioner: Arc<dyn VectorPartitioner>,
}

impl Default for SimilarityClusterer {
    fn default() -> Self {
        Self::new(Arc::new(KMeans::default()))
    }
}

impl SimilarityClusterer {
    pub fn new(partitioner: Arc<dyn VectorPartitioner>) -> Self {
        Self { partitioner }
    }

    /// Labels each vector with a group in `[0, effective_k(n, k))`.
    ///
    /// Fewer than two vectors, or an effective k below two, yield a single
    /// group without consulting the partitioner. A partitioner that panics or
    /// returns the wrong number of labels or an out-of-range label is an error.
    pub fn try_assign(&self, vectors: &[Vec<f32>], k: usize) -> Result<Vec<usize>, ClusterError> {
        let n = vectors.len();
        let k = effective_k(n, k);
        if n < 2 || k < 2 {
            return Ok(single_group(n));
        }

        let labels = catch_unwind(AssertUnwindSafe(|| self.partitioner.partition(vectors, k)))
            .map_err(|_| ClusterError::Failed("partitioner panicked".to_string()))??;
        if labels.len() != n {
            return Err(ClusterError::InvalidLabels(format!(
                "expected {} labels, got {}",
                n,
                labels.len()
            )));
        }
        if let Some(label) = labels.iter().find(|&&label| label >= k) {
            return Err(ClusterError::InvalidLabels(format!(
                "label {} out of range for {} clusters",
                label, k
            )));
        }
        Ok(labels)
    }
}
