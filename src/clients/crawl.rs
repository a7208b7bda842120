//! Crawl service wrapper
//!
//! The crawl service fetches a page on our behalf and returns its extracted
//! text together with the outbound links it found.

use crate::config::{resolve_api_key, CrawlServiceConfig};
use crate::IngestError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the crawl service
#[derive(Debug, Error)]
pub enum CrawlServiceError {
    #[error("crawl service returned {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("crawl request for {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("could not decode crawl response for {url}: {source}")]
    Decode { url: String, source: reqwest::Error },
}

/// Page data returned by the crawl service
///
/// An empty `content` means the page had nothing usable.
/// Missing and `null` fields both decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CrawlResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, rename = "links", deserialize_with = "null_as_default")]
    pub outbound_links: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CrawlResult {
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Something that can crawl a URL
#[async_trait]
pub trait CrawlClient: Send + Sync {
    async fn crawl(&self, url: &str) -> Result<CrawlResult, CrawlServiceError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    include_links: bool,
    remove_html: bool,
    extract_images: bool,
    max_depth: u32,
}

/// HTTP client for the scrape endpoint
pub struct HttpCrawlClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpCrawlClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Builds a client from config, reading the API key from the environment
    pub fn from_config(config: &CrawlServiceConfig) -> Result<Self, IngestError> {
        let api_key = resolve_api_key(&config.api_key_env)?;
        let client = super::build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(client, config.endpoint.clone(), api_key))
    }
}

#[async_trait]
impl CrawlClient for HttpCrawlClient {
    async fn crawl(&self, url: &str) -> Result<CrawlResult, CrawlServiceError> {
        let body = ScrapeRequest {
            url,
            include_links: true,
            remove_html: true,
            extract_images: false,
            max_depth: 2,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| CrawlServiceError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlServiceError::Status {
                url: url.to_string(),
                status,
            });
        }

        response
            .json::<CrawlResult>()
            .await
            .map_err(|source| CrawlServiceError::Decode {
                url: url.to_string(),
                source,
            })
    }
}
