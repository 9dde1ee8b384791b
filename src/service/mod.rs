//! Remote model services
//!
//! The tutor only sees two traits. `GeminiClient` implements both over HTTP;
//! `HashedEmbedder` is a deterministic offline embedder.

pub mod gemini;
pub mod hashed;
pub mod response;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub use gemini::GeminiClient;
pub use hashed::HashedEmbedder;
pub use response::{parse_embeddings, GenerationResponse};

/// Task hint sent with embedding requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
    SemanticSimilarity,
}

/// Batch text embedding
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// One vector per input, in input order
    async fn embed(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> std::result::Result<Vec<Vec<f32>>, ServiceError>;

    /// Model name recorded in the index manifest
    fn model_name(&self) -> &str;
}

/// Single-prompt text generation
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError>;
}
