//! Storage module for persisting ingested documents
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Source record persistence and the age-window candidate query
//! - Document persistence with lineage metadata
//! - Lineage lookups by parent and by crawl session

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::clients::CrawlResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mime type recorded when the crawl service does not report one
pub const DEFAULT_MIME_TYPE: &str = "text/html";

/// An upstream message and the links found in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source_id: String,
    pub received_at: DateTime<Utc>,
    pub links: Vec<String>,
}

/// A link waiting to be crawled, with the source that referenced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub source_id: String,
    pub url: String,
}

/// Lineage metadata attached to every document
///
/// A root lineage starts a new crawl session; a child lineage copies the
/// session, source and root URL from its parent document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    pub source_id: String,
    pub crawl_session_id: String,
    pub parent_document_id: Option<String>,
    pub root_url: String,
}

impl Lineage {
    /// Lineage for a top-level page, with a freshly generated session id
    pub fn root(source_id: &str, url: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            crawl_session_id: Uuid::now_v7().to_string(),
            parent_document_id: None,
            root_url: url.to_string(),
        }
    }

    /// Lineage for a page discovered on `parent`
    pub fn child_of(parent: &Document) -> Self {
        Self {
            source_id: parent.source_id.clone(),
            crawl_session_id: parent.crawl_session_id.clone(),
            parent_document_id: Some(parent.document_id.clone()),
            root_url: parent.root_url.clone(),
        }
    }

    pub fn is_child(&self) -> bool {
        self.parent_document_id.is_some()
    }
}

/// A crawled, embedded page
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub document_id: String,
    pub source_id: String,
    pub url: String,
    pub mime_type: String,
    pub title: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub crawl_session_id: String,
    /// Lookup pointer to the root document; never implies ownership
    pub parent_document_id: Option<String>,
    pub root_url: String,
    /// Same value as `source_id`, kept for query convenience
    pub source_email_id: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Builds a document from a crawl result, falling back to the URL for a
    /// missing title and to `text/html` for a missing mime type.
    pub fn new(url: &str, page: CrawlResult, embedding: Vec<f32>, lineage: Lineage) -> Self {
        let title = if page.title.trim().is_empty() {
            url.to_string()
        } else {
            page.title
        };
        let mime_type = if page.mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            page.mime_type
        };

        Self {
            document_id: Uuid::now_v7().to_string(),
            source_email_id: lineage.source_id.clone(),
            source_id: lineage.source_id,
            url: url.to_string(),
            mime_type,
            title,
            content: page.content,
            embedding,
            crawl_session_id: lineage.crawl_session_id,
            parent_document_id: lineage.parent_document_id,
            root_url: lineage.root_url,
            created_at: Utc::now(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_document_id.is_none()
    }
}

/// Formats a timestamp the way it is stored, so string comparison in SQL
/// orders the same as time.
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
