//! Trigger request and response bodies
//!
//! A trigger is one invocation of the pipeline described by a small JSON
//! body. The response mirrors an HTTP handler: status 200 with a processed
//! count on success, 500 with an error message when the run itself fails.

use crate::clients::{CrawlClient, Embedder};
use crate::config::PipelineConfig;
use crate::pipeline::{Orchestrator, RunReport};
use crate::sources::{import_messages, load_messages};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Body of a crawl trigger; missing fields fall back to the configured defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CrawlRequest {
    #[serde(default)]
    pub max_links: Option<u32>,
    #[serde(default)]
    pub older_than_minutes: Option<u32>,
}

impl CrawlRequest {
    /// Parses a request body, treating a blank body as `{}`
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body)
    }

    /// `(max_links, older_than_minutes)` after applying defaults
    pub fn resolve(&self, defaults: &PipelineConfig) -> (u32, u32) {
        (
            self.max_links.unwrap_or(defaults.max_links),
            self.older_than_minutes
                .unwrap_or(defaults.older_than_minutes),
        )
    }
}

/// Body of a source-ingestion trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceIngestRequest {
    #[serde(default)]
    pub since_hours: Option<u32>,
}

impl SourceIngestRequest {
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(body)
    }

    pub fn resolve(&self, defaults: &PipelineConfig) -> u32 {
        self.since_hours.unwrap_or(defaults.since_hours)
    }
}

/// JSON response returned to the caller of a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub processed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl TriggerResponse {
    /// Success response for a finished crawl run
    pub fn from_report(report: &RunReport) -> Self {
        if report.candidates == 0 {
            return Self {
                success: true,
                processed_count: None,
                message: Some("No new links to process".to_string()),
                error: None,
            };
        }

        let count = report.processed_count();
        Self {
            success: true,
            processed_count: Some(count),
            message: Some(format!("Successfully processed {} links", count)),
            error: None,
        }
    }

    /// Success response for a source import
    pub fn imported(count: usize) -> Self {
        Self {
            success: true,
            processed_count: Some(count),
            message: Some(format!("Successfully processed {} emails", count)),
            error: None,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            processed_count: None,
            message: None,
            error: Some(error.to_string()),
        }
    }

    /// HTTP-style status for this response
    pub fn status_code(&self) -> u16 {
        if self.success {
            200
        } else {
            500
        }
    }
}

/// Runs the crawl pipeline for one trigger request
///
/// Never returns an error: a failed run becomes a `success: false` response.
pub async fn handle_crawl<C, E, S>(
    orchestrator: &mut Orchestrator<C, E, S>,
    request: &CrawlRequest,
    defaults: &PipelineConfig,
) -> TriggerResponse
where
    C: CrawlClient,
    E: Embedder,
    S: Storage,
{
    let (max_links, older_than_minutes) = request.resolve(defaults);

    match orchestrator.run(max_links, older_than_minutes).await {
        Ok(report) => TriggerResponse::from_report(&report),
        Err(e) => {
            tracing::error!("Crawl run failed: {}", e);
            TriggerResponse::failure(e)
        }
    }
}

/// Builds the pipeline and runs one crawl trigger
///
/// A pipeline that cannot be built (missing API key, unreadable database)
/// gets the same failure response as a failed run.
pub async fn handle_crawl_trigger<C, E, S, F>(
    build: F,
    request: &CrawlRequest,
    defaults: &PipelineConfig,
) -> TriggerResponse
where
    C: CrawlClient,
    E: Embedder,
    S: Storage,
    F: FnOnce() -> crate::Result<Orchestrator<C, E, S>>,
{
    match build() {
        Ok(mut orchestrator) => handle_crawl(&mut orchestrator, request, defaults).await,
        Err(e) => {
            tracing::error!("Failed to set up the pipeline: {}", e);
            TriggerResponse::failure(e)
        }
    }
}

/// Opens the store and imports the messages in `file` for one source trigger
pub fn handle_import<S, F>(
    open: F,
    file: &Path,
    request: &SourceIngestRequest,
    defaults: &PipelineConfig,
    now: DateTime<Utc>,
) -> TriggerResponse
where
    S: Storage,
    F: FnOnce() -> crate::Result<S>,
{
    let since_hours = request.resolve(defaults);
    let imported = open().and_then(|mut storage| {
        let messages = load_messages(file)?;
        import_messages(&mut storage, messages, since_hours, now)
    });

    match imported {
        Ok(summary) => TriggerResponse::imported(summary.imported),
        Err(e) => {
            tracing::error!("Import failed: {}", e);
            TriggerResponse::failure(e)
        }
    }
}
