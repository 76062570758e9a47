//! Embedding capability boundary
//!
//! The host supplies the embedding model; this crate only requires the
//! `EmbeddingFunction` contract: deterministic, pure, fixed dimension.
//! `BagOfWordsEmbedder` is a dependency-free implementation for hosts
//! without a model and for tests.

use std::collections::BTreeMap;

/// Embedding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbeddingError {
    /// Embedding backend could not be reached or is not loaded
    #[error("Embedding backend unavailable: {0}")]
    Unavailable(String),

    /// Embedding computation failed for this input
    #[error("Embedding failed: {0}")]
    Failed(String),
}

/// Maps a string to a fixed-dimension numeric vector
///
/// Implementations must be deterministic for identical input and must not
/// perform observable side effects. The gate treats any error as
/// "no trigger" (fails closed).
pub trait EmbeddingFunction: Send + Sync {
    /// Embed `text` into a vector of exactly `dimension()` components
    fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError>;

    /// Fixed output dimension of this embedder
    fn dimension(&self) -> usize;
}

/// Cosine similarity `(a·b)/(‖a‖·‖b‖)`
///
/// Returns `0.0` (non-triggering) when either vector has zero magnitude or
/// when the dimensions disagree, so degenerate input can never surface as a
/// NaN comparison or a division-by-zero panic.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        tracing::debug!(
            left = a.len(),
            right = b.len(),
            "cosine dimension mismatch, treating as zero similarity"
        );
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Weight of the shared anchor component at index 0.
///
/// Every embedded text carries this constant component, which damps the
/// sparsity of short-text bag-of-words vectors: two short messages with
/// partial token overlap land at a moderate similarity instead of being
/// dominated by single-token differences.
const ANCHOR_WEIGHT: f64 = 1.5;

/// Hashed bag-of-words embedder
///
/// Lowercases, splits on non-alphanumeric boundaries, and counts tokens
/// into `dimension - 1` buckets selected by a fixed FNV-1a hash (stable
/// across processes, unlike the stdlib's randomized hasher). Index 0 is
/// the constant anchor component.
#[derive(Debug, Clone)]
pub struct BagOfWordsEmbedder {
    dimension: usize,
}

impl BagOfWordsEmbedder {
    /// Create an embedder with the default dimension (512)
    pub fn new() -> Self {
        Self { dimension: 512 }
    }

    /// Create an embedder with a custom dimension (minimum 2: anchor + one bucket)
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(2),
        }
    }

    /// FNV-1a 64-bit hash (fixed offset basis and prime, process-stable)
    fn fnv1a(token: &str) -> u64 {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }

    /// Token counts for `text`, keyed by bucket index
    fn bucket_counts(&self, text: &str) -> BTreeMap<usize, f64> {
        let buckets = self.dimension - 1;
        let mut counts = BTreeMap::new();
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let index = 1 + (Self::fnv1a(&token) % buckets as u64) as usize;
            *counts.entry(index).or_insert(0.0) += 1.0;
        }
        counts
    }
}

impl Default for BagOfWordsEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingFunction for BagOfWordsEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f64>, EmbeddingError> {
        let mut vector = vec![0.0; self.dimension];
        vector[0] = ANCHOR_WEIGHT;
        for (index, count) in self.bucket_counts(text) {
            vector[index] = count;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
