//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{Document, SourceRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("A document already exists for {0}")]
    DuplicateUrl(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes take `&mut self`: a pipeline run has exactly one writer.
pub trait Storage {
    // ===== Source Records =====

    /// Inserts a source record, replacing any record with the same id
    fn upsert_source(&mut self, record: &SourceRecord) -> StorageResult<()>;

    /// Gets a source record by id
    fn get_source(&self, source_id: &str) -> StorageResult<Option<SourceRecord>>;

    /// Gets up to `limit` source records received strictly before `cutoff`
    /// that still have at least one non-blank link without a document,
    /// oldest first
    fn pending_sources_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> StorageResult<Vec<SourceRecord>>;

    // ===== Documents =====

    /// Returns true if any document has this exact URL
    fn document_exists(&self, url: &str) -> StorageResult<bool>;

    /// Persists a new document
    ///
    /// Fails with `StorageError::DuplicateUrl` if the URL is already stored.
    fn insert_document(&mut self, document: &Document) -> StorageResult<()>;

    /// Gets a document by id
    fn get_document(&self, document_id: &str) -> StorageResult<Option<Document>>;

    /// Gets the document stored for a URL
    fn get_document_by_url(&self, url: &str) -> StorageResult<Option<Document>>;

    /// Gets all documents whose parent is `parent_document_id`, oldest first
    fn get_children(&self, parent_document_id: &str) -> StorageResult<Vec<Document>>;

    /// Gets every document created under a crawl session, oldest first
    fn get_session_documents(&self, crawl_session_id: &str) -> StorageResult<Vec<Document>>;

    // ===== Statistics =====

    /// Counts stored source records
    fn count_sources(&self) -> StorageResult<u64>;

    /// Counts all documents
    fn count_documents(&self) -> StorageResult<u64>;

    /// Counts documents without a parent
    fn count_root_documents(&self) -> StorageResult<u64>;

    /// Counts distinct crawl sessions
    fn count_sessions(&self) -> StorageResult<u64>;
}
