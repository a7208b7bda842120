//! Crawl orchestrator - root and child phases of an ingestion run
//!
//! A run pulls candidate links, and for each one:
//! 1. Starts a new crawl session
//! 2. Crawls, embeds and stores the root page
//! 3. Expands up to `max_child_links` of the root's outbound links one level
//!
//! Work is strictly sequential. Any failure on a single link is recorded in
//! the run report and the run moves on; only the candidate query can fail
//! the whole run.

use crate::clients::{
    truncate_chars, CrawlClient, CrawlServiceError, Embedder, EmbeddingServiceError,
};
use crate::config::DEFAULT_MAX_CHILD_LINKS;
use crate::pipeline::dedup::{unprocessed_links, DedupOracle};
use crate::pipeline::report::{LinkDepth, RunReport};
use crate::storage::{CandidateLink, Document, Lineage, Storage, StorageError};
use crate::IngestError;
use chrono::Utc;
use thiserror::Error;

/// Failure of a single link; never aborts a run
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("dedup check failed: {0}")]
    Dedup(#[source] StorageError),

    #[error(transparent)]
    Crawl(#[from] CrawlServiceError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingServiceError),

    #[error("insert failed: {0}")]
    Insert(#[source] StorageError),
}

/// What happened to one link that did not fail
enum LinkOutcome {
    Persisted {
        document: Document,
        outbound_links: Vec<String>,
    },
    AlreadyIngested,
    EmptyContent,
}

/// Drives crawl, embed and persist for candidate links
///
/// Clients and storage are injected and owned for the lifetime of one
/// invocation.
pub struct Orchestrator<C, E, S> {
    crawler: C,
    embedder: E,
    storage: S,
    max_child_links: usize,
}

impl<C, E, S> Orchestrator<C, E, S>
where
    C: CrawlClient,
    E: Embedder,
    S: Storage,
{
    pub fn new(crawler: C, embedder: E, storage: S) -> Self {
        Self {
            crawler,
            embedder,
            storage,
            max_child_links: DEFAULT_MAX_CHILD_LINKS,
        }
    }

    /// Lowers the per-root child cap; values above the default are clamped
    pub fn with_max_child_links(mut self, max_child_links: usize) -> Self {
        self.max_child_links = max_child_links.min(DEFAULT_MAX_CHILD_LINKS);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Runs one ingestion pass over source records older than
    /// `older_than_minutes`, reading at most `max_links` records.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished; individual links may have failed
    /// * `Err(IngestError::Query)` - The candidate query failed
    pub async fn run(
        &mut self,
        max_links: u32,
        older_than_minutes: u32,
    ) -> Result<RunReport, IngestError> {
        let candidates =
            unprocessed_links(&self.storage, Utc::now(), older_than_minutes, max_links)
                .map_err(IngestError::Query)?;

        tracing::info!(
            "Found {} candidate links (max_links={}, older_than_minutes={})",
            candidates.len(),
            max_links,
            older_than_minutes
        );

        Ok(self.process_candidates(&candidates).await)
    }

    /// Processes candidates in order, folding each outcome into the report
    pub async fn process_candidates(&mut self, candidates: &[CandidateLink]) -> RunReport {
        let mut report = RunReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            if let Err(e) = self.process_root(candidate, &mut report).await {
                tracing::error!("Error processing link {}: {}", candidate.url, e);
                report.record_failure(&candidate.url, LinkDepth::Root, &e);
            }
        }

        tracing::info!(
            "Run finished: {} roots, {} children, {} empty, {} already ingested, {} failed",
            report.roots_persisted,
            report.children_persisted,
            report.skipped_empty,
            report.skipped_existing,
            report.failures.len()
        );

        report
    }

    async fn process_root(
        &mut self,
        candidate: &CandidateLink,
        report: &mut RunReport,
    ) -> Result<(), LinkError> {
        let lineage = Lineage::root(&candidate.source_id, &candidate.url);
        tracing::debug!(
            "Starting crawl session {} for {}",
            lineage.crawl_session_id,
            candidate.url
        );

        match self.ingest(&candidate.url, lineage).await? {
            LinkOutcome::Persisted {
                document,
                outbound_links,
            } => {
                report.roots_persisted += 1;
                if !outbound_links.is_empty() {
                    self.process_children(&document, &outbound_links, report)
                        .await;
                }
            }
            LinkOutcome::AlreadyIngested => report.skipped_existing += 1,
            LinkOutcome::EmptyContent => {
                tracing::info!("No content for link {}", candidate.url);
                report.skipped_empty += 1;
            }
        }

        Ok(())
    }

    /// Child phase: one level only, capped, failures isolated per child
    async fn process_children(
        &mut self,
        root: &Document,
        outbound_links: &[String],
        report: &mut RunReport,
    ) {
        let links: Vec<&str> = outbound_links
            .iter()
            .map(|link| link.trim())
            .filter(|link| !link.is_empty())
            .collect();

        let limit = links.len().min(self.max_child_links);
        if links.len() > limit {
            tracing::debug!(
                "Dropping {} of {} links found on {}",
                links.len() - limit,
                links.len(),
                root.url
            );
        }

        for &child_url in &links[..limit] {
            report.children_attempted += 1;

            match self.ingest(child_url, Lineage::child_of(root)).await {
                Ok(LinkOutcome::Persisted { .. }) => report.children_persisted += 1,
                Ok(LinkOutcome::AlreadyIngested) => report.skipped_existing += 1,
                Ok(LinkOutcome::EmptyContent) => report.skipped_empty += 1,
                Err(e) => {
                    tracing::warn!("Error processing child link {}: {}", child_url, e);
                    report.record_failure(child_url, LinkDepth::Child, &e);
                }
            }
        }
    }

    /// Dedup check, crawl, embed and persist for a single URL
    async fn ingest(&mut self, url: &str, lineage: Lineage) -> Result<LinkOutcome, LinkError> {
        if self.storage.exists(url).map_err(LinkError::Dedup)? {
            tracing::debug!("Skipping {}: already ingested", url);
            return Ok(LinkOutcome::AlreadyIngested);
        }

        let mut page = self.crawler.crawl(url).await?;
        if !page.has_content() {
            return Ok(LinkOutcome::EmptyContent);
        }

        let input = truncate_chars(&page.content, self.embedder.max_input_chars());
        let embedding = self.embedder.embed(input).await?;

        // Children never expand, so their links are dropped here.
        let outbound_links = if lineage.is_child() {
            Vec::new()
        } else {
            std::mem::take(&mut page.outbound_links)
        };

        let document = Document::new(url, page, embedding, lineage);
        match self.storage.insert_document(&document) {
            Ok(()) => {
                tracing::debug!("Stored document {} for {}", document.document_id, url);
                Ok(LinkOutcome::Persisted {
                    document,
                    outbound_links,
                })
            }
            Err(StorageError::DuplicateUrl(_)) => {
                tracing::warn!("{} was stored by a concurrent run, skipping", url);
                Ok(LinkOutcome::AlreadyIngested)
            }
            Err(e) => Err(LinkError::Insert(e)),
        }
    }
}
