//! Embedding service wrapper for OpenAI-compatible endpoints

use crate::config::{resolve_api_key, EmbeddingConfig};
use crate::IngestError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the embedding service
#[derive(Debug, Error)]
pub enum EmbeddingServiceError {
    #[error("embedding service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("embedding request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("could not decode embedding response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("embedding service returned no vectors")]
    Empty,

    #[error("expected a {expected}-dimension vector, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Something that turns text into a vector
///
/// Callers must cut the input to `max_input_chars` before calling `embed`.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError>;

    /// Input budget in characters
    fn max_input_chars(&self) -> usize;
}

/// Returns the longest prefix of `text` holding at most `max_chars` characters.
///
/// The embedding model's real limit is counted in tokens, so this is only an
/// approximation: it never splits a UTF-8 sequence, but dense or multi-byte
/// text can still exceed the token limit at the same character count.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// HTTP client for `{endpoint}/embeddings`
pub struct HttpEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_input_chars: usize,
    dimensions: Option<usize>,
}

impl HttpEmbedder {
    pub fn new(
        client: Client,
        base_url: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_input_chars: usize,
        dimensions: Option<usize>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.into(),
            max_input_chars,
            dimensions,
        }
    }

    /// Builds an embedder from config, reading the API key from the environment
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, IngestError> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        let client = super::build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(
            client,
            &config.endpoint,
            config.model.clone(),
            api_key,
            config.max_input_chars,
            config.dimensions,
        ))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingServiceError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(EmbeddingServiceError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingServiceError::Status { status, body });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(EmbeddingServiceError::Decode)?;

        let embedding = parsed
            .data
            .into_iter()
            .min_by_key(|entry| entry.index)
            .map(|entry| entry.embedding)
            .ok_or(EmbeddingServiceError::Empty)?;

        if let Some(expected) = self.dimensions {
            if embedding.len() != expected {
                return Err(EmbeddingServiceError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        Ok(embedding)
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }
}
