//! Clients for the external crawl and embedding services
//!
//! Both services sit behind traits so the orchestrator can be driven by the
//! HTTP implementations in production and by in-process fakes in tests.

mod crawl;
mod embedding;

pub use crawl::{CrawlClient, CrawlResult, CrawlServiceError, HttpCrawlClient};
pub use embedding::{truncate_chars, Embedder, EmbeddingServiceError, HttpEmbedder};

use reqwest::Client;
use std::time::Duration;

/// Builds the shared HTTP client used by the service wrappers
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("linkdoc-ingest/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
