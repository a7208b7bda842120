//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the ingest database.

/// SQL schema for the database
///
/// `parent_document_id` is deliberately not a foreign key: removing a parent
/// row leaves its children in place.
pub const SCHEMA_SQL: &str = r#"
-- Upstream messages and the links found in them
CREATE TABLE IF NOT EXISTS sources (
    source_id TEXT PRIMARY KEY,
    received_at TEXT NOT NULL,
    links TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS idx_sources_received_at ON sources(received_at);

-- Crawled and embedded pages
CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    url TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    crawl_session_id TEXT NOT NULL,
    parent_document_id TEXT,
    root_url TEXT NOT NULL,
    source_email_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_url ON documents(url);
CREATE INDEX IF NOT EXISTS idx_documents_parent ON documents(parent_document_id);
CREATE INDEX IF NOT EXISTS idx_documents_session ON documents(crawl_session_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
