//! Subcommand handlers: build, ask, config, and tutor assembly for chat

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chunking::{load_codec, Chunker};
use crate::config::{Config, EmbeddingProvider};
use crate::index::{IndexBuilder, IndexStore};
use crate::repl::display;
use crate::retrieval::Retriever;
use crate::retry::RetryExecutor;
use crate::service::{EmbeddingService, GeminiClient, GenerationService, HashedEmbedder};
use crate::session::SessionState;
use crate::tutor::{Tutor, TurnOutcome};

use super::Verbosity;

/// Embedding backend selected by `service.embedding_provider`
pub fn embedding_service(config: &Config) -> Result<Arc<dyn EmbeddingService>> {
    let service: Arc<dyn EmbeddingService> = match config.service.embedding_provider {
        EmbeddingProvider::Gemini => Arc::new(GeminiClient::from_env(&config.service)?),
        EmbeddingProvider::Hashed => Arc::new(HashedEmbedder::new(config.service.hashed_dimension)),
    };

    Ok(service)
}

pub fn generation_service(config: &Config) -> Result<Arc<dyn GenerationService>> {
    Ok(Arc::new(GeminiClient::from_env(&config.service)?))
}

/// `studybuddy build`
pub async fn run_build(
    config: &Config,
    lessons: Option<PathBuf>,
    verbosity: Verbosity,
) -> Result<()> {
    let lessons_dir = lessons.unwrap_or_else(|| config.index.lessons_dir.clone());

    let codec = load_codec(&config.index.tokenizer).context("Failed to load tokenizer")?;
    let chunker = Chunker::new(codec, config.index.chunk_size, config.index.overlap)?;

    let builder = IndexBuilder::new(
        chunker,
        embedding_service(config)?,
        RetryExecutor::from_config(&config.retry),
        config.index.batch_size,
    )
    .with_progress(verbosity.show_progress());

    let store = builder
        .build_from_dir(&lessons_dir)
        .await
        .with_context(|| format!("Index build from {} failed", lessons_dir.display()))?;

    store.save(&config.index.embeddings_file, &config.index.metadata_file)?;

    println!(
        "{} Indexed {} chunks (dimension {}) into {} and {}",
        "✓".green(),
        store.len(),
        store.dimension(),
        config.index.embeddings_file.display(),
        config.index.metadata_file.display()
    );

    Ok(())
}

/// Load the index and wire up a tutor for `chat` and `ask`
pub fn load_tutor(config: &Config) -> Result<Tutor> {
    let store = IndexStore::load(&config.index.embeddings_file, &config.index.metadata_file)?;

    let embedder = embedding_service(config)?;
    if store.embed_model() != embedder.model_name() {
        warn!(
            index_model = store.embed_model(),
            query_model = embedder.model_name(),
            "Index was built with a different embedding model; rebuild for meaningful scores"
        );
    }

    info!(chunks = store.len(), built_at = %store.built_at(), "Tutor ready");

    let retriever = Retriever::new(Arc::new(store), config.retrieval.similarity_threshold);
    Ok(Tutor::from_config(config, retriever, embedder, generation_service(config)?))
}

/// `studybuddy ask`
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let tutor = load_tutor(config)?;
    let (_, outcome) = tutor.turn(SessionState::new(), question).await;
    ask_result(outcome)
}

/// Failed turns become errors so `ask` exits non-zero
fn ask_result(outcome: TurnOutcome) -> Result<()> {
    match outcome {
        TurnOutcome::Failed(failure) => Err(anyhow!(failure.message)),
        other => {
            display::show_outcome(&other);
            Ok(())
        }
    }
}

/// `studybuddy config`
pub fn run_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
