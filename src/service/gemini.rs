//! Generative Language API client
//!
//! - Embeddings: `POST {base}/v1beta/models/{model}:batchEmbedContents`
//! - Generation: `POST {base}/v1beta/models/{model}:generateContent`
//!
//! Non-success statuses become `ServiceError`s whose kind follows the
//! status code, so the retry policy can tell transient from permanent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::response::{parse_embeddings, GenerationResponse};
use super::{EmbeddingService, GenerationService, TaskType};
use crate::config::ServiceConfig;
use crate::errors::{Result, ServiceError, ServiceErrorKind, TutorError};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for embedding and generation
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embed_model: String,
    generation_model: String,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

impl GeminiClient {
    /// Create a client from service settings and an API key
    pub fn with_config(config: &ServiceConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TutorError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            embed_model: config.embed_model.clone(),
            generation_model: config.generation_model.clone(),
        })
    }

    /// Create a client reading the key from `config.api_key_env`
    pub fn from_env(config: &ServiceConfig) -> Result<Self> {
        let key = config.api_key().ok_or_else(|| {
            TutorError::ConfigError(format!(
                "{} is not set (environment or .env)",
                config.api_key_env
            ))
        })?;

        Self::with_config(config, key)
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> std::result::Result<Value, ServiceError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::new(
                ServiceErrorKind::from_status(status.as_u16()),
                format!("HTTP {}: {}", status, error_text),
            ));
        }

        Ok(response.json::<Value>().await?)
    }
}

fn batch_embed_request<'a>(
    model: &str,
    texts: &'a [String],
    task: TaskType,
) -> BatchEmbedRequest<'a> {
    BatchEmbedRequest {
        requests: texts
            .iter()
            .map(|text| EmbedRequest {
                model: format!("models/{}", model),
                content: Content {
                    role: None,
                    parts: vec![Part { text: text.as_str() }],
                },
                task_type: task,
            })
            .collect(),
    }
}

fn generate_request(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: prompt }],
        }],
    }
}

#[async_trait]
impl EmbeddingService for GeminiClient {
    async fn embed(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> std::result::Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint(&self.embed_model, "batchEmbedContents");
        let body = batch_embed_request(&self.embed_model, texts, task);

        debug!(count = texts.len(), model = %self.embed_model, "Embedding request");
        let value = self.post_json(&url, &body).await?;

        parse_embeddings(&value, texts.len())
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ServiceError> {
        let url = self.endpoint(&self.generation_model, "generateContent");

        debug!(prompt_chars = prompt.len(), model = %self.generation_model, "Generation request");
        let value = self.post_json(&url, &generate_request(prompt)).await?;

        let response = GenerationResponse::from_value(value);
        if matches!(response, GenerationResponse::Raw(_)) {
            debug!("Generation response had no known text field");
        }

        Ok(response.into_text())
    }
}
