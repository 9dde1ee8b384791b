//! Offline index build
//!
//! documents → chunks with global ids → batched embedding → `IndexStore`

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::documents::{read_lessons, Document};
use super::store::{ChunkMetadata, IndexStore};
use crate::chunking::Chunker;
use crate::errors::{Result, TutorError};
use crate::retry::RetryExecutor;
use crate::service::{EmbeddingService, TaskType};

/// Chunks documents and embeds them in fixed-size batches
pub struct IndexBuilder {
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingService>,
    retry: RetryExecutor,
    batch_size: usize,
    show_progress: bool,
}

impl IndexBuilder {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn EmbeddingService>,
        retry: RetryExecutor,
        batch_size: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            retry,
            batch_size: batch_size.max(1),
            show_progress: false,
        }
    }

    /// Draw a progress bar over embedding batches
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Read the lessons folder and build the index
    pub async fn build_from_dir(&self, dir: &Path) -> Result<IndexStore> {
        let documents = read_lessons(dir)?;
        if documents.is_empty() {
            return Err(TutorError::NoDocuments(dir.to_path_buf()));
        }

        self.build(&documents).await.map_err(|e| match e {
            TutorError::NoDocuments(_) => TutorError::NoDocuments(dir.to_path_buf()),
            other => other,
        })
    }

    /// Chunk and embed documents. Ids follow document order, then chunk order.
    pub async fn build(&self, documents: &[Document]) -> Result<IndexStore> {
        // Step 1: chunk and assign global ids
        let mut metadata = Vec::new();
        for doc in documents {
            let chunks = match self.chunker.chunk(&doc.text) {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(file = %doc.source, error = %e, "Skipping document that failed to chunk");
                    continue;
                }
            };

            debug!(file = %doc.source, chunks = chunks.len(), "Document chunked");
            for (chunk_index, text) in chunks.into_iter().enumerate() {
                metadata.push(ChunkMetadata {
                    id: metadata.len(),
                    source: doc.source.clone(),
                    chunk_index,
                    text,
                });
            }
        }

        if metadata.is_empty() {
            return Err(TutorError::NoDocuments(Default::default()));
        }

        info!(
            documents = documents.len(),
            chunks = metadata.len(),
            "Total chunks to embed"
        );

        // Step 2: embed in batches
        let vectors = self.embed_all(&metadata).await?;

        // Step 3: assemble the aligned store
        IndexStore::from_parts(metadata, vectors, self.embedder.model_name())
    }

    async fn embed_all(&self, metadata: &[ChunkMetadata]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = metadata.iter().map(|m| m.text.clone()).collect();
        let total_batches = (texts.len() + self.batch_size - 1) / self.batch_size;

        let progress = if self.show_progress {
            let pb = ProgressBar::new(total_batches as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut vectors = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            let embedded = self
                .retry
                .execute(|| self.embedder.embed(batch, TaskType::RetrievalDocument))
                .await
                .map_err(TutorError::EmbeddingFailure)?;

            if embedded.len() != batch.len() {
                return Err(TutorError::EmbeddingFailure(
                    crate::errors::ServiceError::malformed(format!(
                        "batch {} returned {} vectors for {} texts",
                        i + 1,
                        embedded.len(),
                        batch.len()
                    )),
                ));
            }

            vectors.extend(embedded);
            progress.inc(1);
            info!(batch = i + 1, total = total_batches, "embedded batch");
        }
        progress.finish_and_clear();

        Ok(vectors)
    }
}
