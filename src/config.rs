//! Configuration loading
//!
//! A single TOML file, `~/.studybuddy/config.toml` by default, created with
//! defaults on first run. Every section may be omitted or given partially.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::TutorError;
use crate::retry::RetryPolicy;
use crate::service::TaskType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

/// Where the chunker gets its token codec from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerSource {
    /// One token per Unicode scalar value; needs no files
    Chars,
    /// Local `tokenizer.json`
    File(PathBuf),
    /// `tokenizer.json` fetched from a Hugging Face repo
    HuggingFace(String),
}

impl Default for TokenizerSource {
    fn default() -> Self {
        // cl100k_base packaged as a tokenizers JSON
        TokenizerSource::HuggingFace("Xenova/text-embedding-ada-002".to_string())
    }
}

/// Offline index build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub lessons_dir: PathBuf,
    pub embeddings_file: PathBuf,
    pub metadata_file: PathBuf,
    /// Window length in tokens
    pub chunk_size: usize,
    /// Tokens shared by consecutive windows
    pub overlap: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    pub tokenizer: TokenizerSource,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            lessons_dir: PathBuf::from("lessons"),
            embeddings_file: PathBuf::from("embeddings.json"),
            metadata_file: PathBuf::from("metadata.json"),
            chunk_size: 500,
            overlap: 50,
            batch_size: 50,
            tokenizer: TokenizerSource::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Minimum top score for an answer to count as grounded
    pub similarity_threshold: f32,
    /// Task hint sent when embedding user text
    pub query_task_type: TaskType,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            similarity_threshold: 0.06,
            query_task_type: TaskType::RetrievalDocument,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub policy: RetryPolicy,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_delay_ms: 1000,
            backoff_factor: 1.7,
            policy: RetryPolicy::All,
            jitter: false,
        }
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    Gemini,
    /// Deterministic offline bag-of-words vectors
    Hashed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub embed_model: String,
    pub generation_model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub embedding_provider: EmbeddingProvider,
    /// Dimension of the hashed embedder
    pub hashed_dimension: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            embed_model: "gemini-embedding-001".to_string(),
            generation_model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
            embedding_provider: EmbeddingProvider::Gemini,
            hashed_dimension: 768,
        }
    }
}

impl ServiceConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Appended to the built-in disallowed list
    pub extra_keywords: Vec<String>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// and populated with defaults if absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    let config = Config::default();
                    config.save_to(&path)?;
                    config
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path, self.to_toml()?).context("Failed to write config file")?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".studybuddy").join("config.toml"))
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> crate::errors::Result<()> {
        let invalid = |msg: &str| Err(TutorError::ConfigError(msg.to_string()));

        if self.index.chunk_size == 0 {
            return invalid("index.chunk_size must be at least 1");
        }
        if self.index.batch_size == 0 {
            return invalid("index.batch_size must be at least 1");
        }
        if self.retrieval.top_k == 0 {
            return invalid("retrieval.top_k must be at least 1");
        }
        if self.retry.max_retries == 0 {
            return invalid("retry.max_retries must be at least 1");
        }
        if !(self.retry.backoff_factor >= 1.0) {
            return invalid("retry.backoff_factor must be >= 1.0");
        }
        if self.service.hashed_dimension == 0 {
            return invalid("service.hashed_dimension must be at least 1");
        }

        Ok(())
    }
}
