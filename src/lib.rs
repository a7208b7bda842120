//! linkdoc-ingest: a lineage-aware link ingestion pipeline
//!
//! This crate takes the links found in inbound messages, fetches each page
//! through an external crawl service, embeds the extracted text and stores
//! one document per URL. Each root page expands one level of child links,
//! and every document records the crawl session and parent it came from.

pub mod clients;
pub mod config;
pub mod lineage;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod storage;
pub mod trigger;

use thiserror::Error;

/// Main error type for linkdoc-ingest operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Query error: {0}")]
    Query(storage::StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl service error: {0}")]
    CrawlService(#[from] clients::CrawlServiceError),

    #[error("Embedding service error: {0}")]
    EmbeddingService(#[from] clients::EmbeddingServiceError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document not found for {0}")]
    NotFound(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Result type alias for linkdoc-ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use clients::{CrawlClient, CrawlResult, Embedder};
pub use config::Config;
pub use pipeline::{DedupOracle, Orchestrator, RunReport};
pub use storage::{Document, SqliteStorage, Storage};
