//! Configuration module for linkdoc-ingest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use linkdoc_ingest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ingest.toml")).unwrap();
//! println!("Child links per root: {}", config.pipeline.max_child_links);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlServiceConfig, EmbeddingConfig, OutputConfig, PipelineConfig,
    DEFAULT_MAX_CHILD_LINKS, DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_LINKS,
    DEFAULT_OLDER_THAN_MINUTES, DEFAULT_SINCE_HOURS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, resolve_api_key};
