//! Token codecs used by the chunker
//!
//! Windows are measured in tokens, so chunk text is produced by decoding a
//! token subsequence back into a string.

use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

use crate::config::TokenizerSource;
use crate::errors::{Result, TutorError};

/// Encode text into token ids and back
pub trait TokenCodec: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    fn decode(&self, ids: &[u32]) -> Result<String>;
}

/// Codec backed by a Hugging Face `tokenizer.json`
#[derive(Clone)]
pub struct HfTokenCodec {
    tokenizer: Arc<Tokenizer>,
}

impl HfTokenCodec {
    /// Load from a local `tokenizer.json`
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            TutorError::Tokenizer(format!("failed to load {}: {}", path.display(), e))
        })?;

        Ok(Self {
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Download (or reuse the cached) `tokenizer.json` of a hub repo
    pub fn from_hub(repo_id: &str) -> Result<Self> {
        let api = Api::new()
            .map_err(|e| TutorError::Tokenizer(format!("hub client unavailable: {}", e)))?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

        let path = repo.get("tokenizer.json").map_err(|e| {
            TutorError::Tokenizer(format!("failed to fetch tokenizer for {}: {}", repo_id, e))
        })?;

        tracing::debug!(repo = repo_id, path = %path.display(), "tokenizer resolved");
        Self::from_file(&path)
    }
}

impl TokenCodec for HfTokenCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| TutorError::Tokenizer(e.to_string()))?;

        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, false)
            .map_err(|e| TutorError::Tokenizer(e.to_string()))
    }
}

/// One token per Unicode scalar value. Lossless and needs no files.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCodec;

impl TokenCodec for CharCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        ids.iter()
            .map(|&id| {
                char::from_u32(id)
                    .ok_or_else(|| TutorError::Tokenizer(format!("invalid scalar value {}", id)))
            })
            .collect()
    }
}

/// Build the codec a config asks for
pub fn load_codec(source: &TokenizerSource) -> Result<Arc<dyn TokenCodec>> {
    let codec: Arc<dyn TokenCodec> = match source {
        TokenizerSource::Chars => Arc::new(CharCodec),
        TokenizerSource::File(path) => Arc::new(HfTokenCodec::from_file(path)?),
        TokenizerSource::HuggingFace(repo) => Arc::new(HfTokenCodec::from_hub(repo)?),
    };

    Ok(codec)
}
