//! Source records from inbound messages
//!
//! Fetching mail is out of scope; messages arrive as a JSON file instead.
//! Each message becomes a `SourceRecord` whose links are either supplied
//! directly or pulled out of the message body.

use crate::storage::{SourceRecord, Storage};
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'`]+"#).expect("valid link regex"));

/// Characters that end a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>'];

/// A message as it appears in an import file
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub source_id: String,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
}

impl InboundMessage {
    /// Explicit `links` win over links found in `body`
    pub fn into_record(self) -> SourceRecord {
        let links = match (self.links, self.body) {
            (Some(links), _) => links,
            (None, Some(body)) => extract_links(&body),
            (None, None) => Vec::new(),
        };
        SourceRecord {
            source_id: self.source_id,
            received_at: self.received_at,
            links,
        }
    }
}

/// Counts from one import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_stale: usize,
}

/// Finds http(s) URLs in free text, in order of appearance, without repeats
pub fn extract_links(text: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for m in LINK_RE.find_iter(text) {
        let candidate = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if Url::parse(candidate).is_err() {
            continue;
        }
        if !links.iter().any(|l| l == candidate) {
            links.push(candidate.to_string());
        }
    }
    links
}

/// Reads a JSON array of messages
pub fn load_messages(path: &Path) -> Result<Vec<InboundMessage>> {
    let content = std::fs::read_to_string(path)?;
    let messages = serde_json::from_str(&content)?;
    Ok(messages)
}

/// Stores messages received within the last `since_hours` as source records
pub fn import_messages<S: Storage + ?Sized>(
    storage: &mut S,
    messages: Vec<InboundMessage>,
    since_hours: u32,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    let window_start = now - Duration::hours(i64::from(since_hours));
    let mut summary = ImportSummary::default();

    for message in messages {
        if message.received_at < window_start {
            tracing::debug!("Skipping {}: older than {}h", message.source_id, since_hours);
            summary.skipped_stale += 1;
            continue;
        }

        let record = message.into_record();
        tracing::debug!(
            "Importing {} with {} links",
            record.source_id,
            record.links.len()
        );
        storage.upsert_source(&record)?;
        summary.imported += 1;
    }

    tracing::info!(
        "Imported {} source records ({} outside the {}h window)",
        summary.imported,
        summary.skipped_stale,
        since_hours
    );

    Ok(summary)
}
