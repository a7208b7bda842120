//! Dedup oracle and candidate selection
//!
//! The existence check is advisory: two overlapping runs can both see a URL
//! as absent. The unique index on `documents.url` catches the second insert.

use crate::storage::{CandidateLink, Storage, StorageResult};
use chrono::{DateTime, Duration, Utc};

/// Reports whether a document already exists for a URL
pub trait DedupOracle {
    fn exists(&self, url: &str) -> StorageResult<bool>;
}

impl<S: Storage + ?Sized> DedupOracle for S {
    fn exists(&self, url: &str) -> StorageResult<bool> {
        self.document_exists(url)
    }
}

/// Collects links from up to `max_links` source records received before
/// `now - older_than_minutes` that are not yet fully processed, dropping any
/// URL that already has a document.
///
/// Order follows the source query (oldest record first), then link order
/// within each record.
pub fn unprocessed_links<S: Storage + ?Sized>(
    storage: &S,
    now: DateTime<Utc>,
    older_than_minutes: u32,
    max_links: u32,
) -> StorageResult<Vec<CandidateLink>> {
    let cutoff = now - Duration::minutes(i64::from(older_than_minutes));
    let sources = storage.pending_sources_before(cutoff, max_links)?;

    let mut candidates = Vec::new();
    for source in sources {
        for url in source.links {
            let url = url.trim();
            if url.is_empty() {
                continue;
            }
            if storage.exists(url)? {
                tracing::debug!("Skipping {}: already ingested", url);
                continue;
            }
            candidates.push(CandidateLink {
                source_id: source.source_id.clone(),
                url: url.to_string(),
            });
        }
    }

    Ok(candidates)
}
