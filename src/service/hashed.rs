//! Offline bag-of-words embedder
//!
//! Each lowercased alphanumeric word is hashed with xxHash64 into one of
//! `dimension` buckets; the count vector is L2-normalised. Texts sharing
//! vocabulary score higher, which is enough for offline indexing and tests.

use async_trait::async_trait;
use std::hash::Hasher;
use twox_hash::XxHash64;

use super::{EmbeddingService, TaskType};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model_name: format!("hashed-bow-{}", dimension.max(1)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed one text. Text without words maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(word.to_lowercase().as_bytes());
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        vector
    }
}

#[async_trait]
impl EmbeddingService for HashedEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _task: TaskType,
    ) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
