use crate::config::types::{
    Config, CrawlServiceConfig, EmbeddingConfig, OutputConfig, PipelineConfig,
    DEFAULT_MAX_CHILD_LINKS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_service(&config.crawl_service)?;
    validate_embedding(&config.embedding)?;
    validate_pipeline(&config.pipeline)?;
    validate_output(&config.output)?;
    Ok(())
}

fn validate_crawl_service(config: &CrawlServiceConfig) -> Result<(), ConfigError> {
    validate_endpoint("crawl-service.endpoint", &config.endpoint)?;
    validate_env_name("crawl-service.api-key-env", &config.api_key_env)?;

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawl-service.timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_embedding(config: &EmbeddingConfig) -> Result<(), ConfigError> {
    validate_endpoint("embedding.endpoint", &config.endpoint)?;
    validate_env_name("embedding.api-key-env", &config.api_key_env)?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "embedding.model cannot be empty".to_string(),
        ));
    }

    if config.max_input_chars == 0 {
        return Err(ConfigError::Validation(
            "embedding.max-input-chars must be >= 1".to_string(),
        ));
    }

    if config.dimensions == Some(0) {
        return Err(ConfigError::Validation(
            "embedding.dimensions must be >= 1 when set".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "embedding.timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.max_links < 1 {
        return Err(ConfigError::Validation(format!(
            "pipeline.max-links must be >= 1, got {}",
            config.max_links
        )));
    }

    if config.max_child_links > DEFAULT_MAX_CHILD_LINKS {
        return Err(ConfigError::Validation(format!(
            "pipeline.max-child-links must be at most {}, got {}",
            DEFAULT_MAX_CHILD_LINKS, config.max_child_links
        )));
    }

    Ok(())
}

fn validate_output(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Endpoints must be absolute http(s) URLs
fn validate_endpoint(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("{} '{}': {}", field, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, other
        ))),
    }
}

fn validate_env_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-empty environment variable name, got '{}'",
            field, value
        )));
    }
    Ok(())
}
