use serde::Deserialize;

/// Default number of source records scanned per crawl run
pub const DEFAULT_MAX_LINKS: u32 = 50;

/// Default minimum age of a source record before its links are crawled
pub const DEFAULT_OLDER_THAN_MINUTES: u32 = 60;

/// Upper bound on child links expanded from one root page
pub const DEFAULT_MAX_CHILD_LINKS: usize = 5;

/// Default look-back window for source record imports
pub const DEFAULT_SINCE_HOURS: u32 = 24;

/// Character budget standing in for the embedding model's token limit
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8191;

/// Main configuration structure for linkdoc-ingest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "crawl-service")]
    pub crawl_service: CrawlServiceConfig,
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

/// External crawl service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlServiceConfig {
    /// Scrape endpoint URL
    pub endpoint: String,

    /// Name of the environment variable holding the bearer token
    #[serde(rename = "api-key-env", default = "default_crawl_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Embedding service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API (the client appends `/embeddings`)
    pub endpoint: String,

    /// Embedding model name
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_embedding_key_env")]
    pub api_key_env: String,

    /// Maximum number of characters sent per request
    #[serde(rename = "max-input-chars", default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Expected vector length; responses of any other length are rejected
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Orchestrator defaults, overridable per trigger request
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "max-links", default = "default_max_links")]
    pub max_links: u32,

    #[serde(rename = "older-than-minutes", default = "default_older_than_minutes")]
    pub older_than_minutes: u32,

    #[serde(rename = "max-child-links", default = "default_max_child_links")]
    pub max_child_links: usize,

    #[serde(rename = "since-hours", default = "default_since_hours")]
    pub since_hours: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_links: DEFAULT_MAX_LINKS,
            older_than_minutes: DEFAULT_OLDER_THAN_MINUTES,
            max_child_links: DEFAULT_MAX_CHILD_LINKS,
            since_hours: DEFAULT_SINCE_HOURS,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_crawl_key_env() -> String {
    "CRAWL4AI_API_KEY".to_string()
}

fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

fn default_max_links() -> u32 {
    DEFAULT_MAX_LINKS
}

fn default_older_than_minutes() -> u32 {
    DEFAULT_OLDER_THAN_MINUTES
}

fn default_max_child_links() -> usize {
    DEFAULT_MAX_CHILD_LINKS
}

fn default_since_hours() -> u32 {
    DEFAULT_SINCE_HOURS
}
