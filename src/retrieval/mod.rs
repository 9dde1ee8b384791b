//! Exhaustive cosine-similarity search over the index
//!
//! Every stored vector is scored; results are ordered by descending score
//! with ties broken by ascending chunk id.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{Result, TutorError};
use crate::index::{ChunkMetadata, IndexStore};

/// Cosine similarity in [-1, 1].
///
/// Returns 0.0 for vectors of different length or when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_nan() {
        return 0.0;
    }
    sim.clamp(-1.0, 1.0) as f32
}

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: ChunkMetadata,
    pub score: f32,
}

impl ScoredChunk {
    pub fn id(&self) -> usize {
        self.chunk.id
    }
}

/// Ranked search output plus the grounding verdict
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub chunks: Vec<ScoredChunk>,
    pub grounded: bool,
}

impl RetrievalResult {
    pub fn top_score(&self) -> Option<f32> {
        self.chunks.first().map(|c| c.score)
    }
}

/// Grounded iff at least one chunk was retrieved and the best score reaches the threshold
pub fn is_grounded(chunks: &[ScoredChunk], threshold: f32) -> bool {
    chunks.first().map_or(false, |top| top.score >= threshold)
}

/// Brute-force nearest-neighbour search
#[derive(Debug, Clone)]
pub struct Retriever {
    store: Arc<IndexStore>,
    threshold: f32,
}

impl Retriever {
    pub fn new(store: Arc<IndexStore>, threshold: f32) -> Self {
        Self { store, threshold }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Score every entry and keep the `k` best
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if !self.store.is_empty() && query.len() != self.store.dimension() {
            return Err(TutorError::DimensionMismatch {
                expected: self.store.dimension(),
                actual: query.len(),
            });
        }

        let mut ranked: Vec<(&ChunkMetadata, f32)> = self
            .store
            .entries()
            .map(|(chunk, vector)| (chunk, cosine_similarity(query, vector)))
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        ranked.truncate(k);

        // Only the survivors are cloned
        let scored: Vec<ScoredChunk> = ranked
            .into_iter()
            .map(|(chunk, score)| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
            .collect();

        let grounded = is_grounded(&scored, self.threshold);

        debug!(
            k,
            returned = scored.len(),
            top_score = scored.first().map(|c| c.score).unwrap_or(0.0),
            grounded,
            "Retrieval complete"
        );

        Ok(RetrievalResult {
            chunks: scored,
            grounded,
        })
    }
}
