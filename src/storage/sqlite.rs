//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{to_db_timestamp, Document, SourceRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

const DOCUMENT_COLUMNS: &str = "document_id, source_id, url, mime_type, title, content, embedding,
     crawl_session_id, parent_document_id, root_url, source_email_id, created_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and applies the schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_documents(&self, sql: &str, key: &str) -> StorageResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(sql)?;
        let documents = stmt
            .query_map(params![key], row_to_document)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    fn query_document(&self, sql: &str, key: &str) -> StorageResult<Option<Document>> {
        let document = self
            .conn
            .query_row(sql, params![key], row_to_document)
            .optional()?;
        Ok(document)
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Source Records =====

    fn upsert_source(&mut self, record: &SourceRecord) -> StorageResult<()> {
        let links = serde_json::to_string(&record.links)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn.execute(
            "INSERT OR REPLACE INTO sources (source_id, received_at, links) VALUES (?1, ?2, ?3)",
            params![record.source_id, to_db_timestamp(&record.received_at), links],
        )?;
        Ok(())
    }

    fn get_source(&self, source_id: &str) -> StorageResult<Option<SourceRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT source_id, received_at, links FROM sources WHERE source_id = ?1",
                params![source_id],
                row_to_source,
            )
            .optional()?;
        Ok(record)
    }

    fn pending_sources_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> StorageResult<Vec<SourceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, received_at, links FROM sources
             WHERE received_at < ?1
               AND EXISTS (
                   SELECT 1 FROM json_each(sources.links) AS link
                   WHERE trim(link.value) <> ''
                     AND NOT EXISTS (
                         SELECT 1 FROM documents WHERE documents.url = trim(link.value)
                     )
               )
             ORDER BY received_at ASC, source_id ASC
             LIMIT ?2",
        )?;

        let records = stmt
            .query_map(params![to_db_timestamp(&cutoff), limit], row_to_source)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Documents =====

    fn document_exists(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM documents WHERE url = ?1 LIMIT 1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_document(&mut self, document: &Document) -> StorageResult<()> {
        let result = self.conn.execute(
            "INSERT INTO documents (document_id, source_id, url, mime_type, title, content,
             embedding, crawl_session_id, parent_document_id, root_url, source_email_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                document.document_id,
                document.source_id,
                document.url,
                document.mime_type,
                document.title,
                document.content,
                embedding_to_blob(&document.embedding),
                document.crawl_session_id,
                document.parent_document_id,
                document.root_url,
                document.source_email_id,
                to_db_timestamp(&document.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, Some(message)))
                if is_url_conflict(&err, &message) =>
            {
                Err(StorageError::DuplicateUrl(document.url.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_document(&self, document_id: &str) -> StorageResult<Option<Document>> {
        self.query_document(
            &format!("SELECT {} FROM documents WHERE document_id = ?1", DOCUMENT_COLUMNS),
            document_id,
        )
    }

    fn get_document_by_url(&self, url: &str) -> StorageResult<Option<Document>> {
        self.query_document(
            &format!("SELECT {} FROM documents WHERE url = ?1", DOCUMENT_COLUMNS),
            url,
        )
    }

    fn get_children(&self, parent_document_id: &str) -> StorageResult<Vec<Document>> {
        self.query_documents(
            &format!(
                "SELECT {} FROM documents WHERE parent_document_id = ?1
                 ORDER BY created_at ASC, document_id ASC",
                DOCUMENT_COLUMNS
            ),
            parent_document_id,
        )
    }

    fn get_session_documents(&self, crawl_session_id: &str) -> StorageResult<Vec<Document>> {
        self.query_documents(
            &format!(
                "SELECT {} FROM documents WHERE crawl_session_id = ?1
                 ORDER BY created_at ASC, document_id ASC",
                DOCUMENT_COLUMNS
            ),
            crawl_session_id,
        )
    }

    // ===== Statistics =====

    fn count_sources(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM sources")
    }

    fn count_documents(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM documents")
    }

    fn count_root_documents(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM documents WHERE parent_document_id IS NULL")
    }

    fn count_sessions(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT crawl_session_id) FROM documents")
    }
}

/// True only for the unique index on `documents.url`
fn is_url_conflict(err: &rusqlite::ffi::Error, message: &str) -> bool {
    err.code == ErrorCode::ConstraintViolation
        && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        && message.contains("documents.url")
}

fn row_to_source(row: &Row<'_>) -> rusqlite::Result<SourceRecord> {
    let links: String = row.get(2)?;
    Ok(SourceRecord {
        source_id: row.get(0)?,
        received_at: parse_timestamp(row, 1)?,
        links: serde_json::from_str(&links)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let embedding: Vec<u8> = row.get(6)?;
    Ok(Document {
        document_id: row.get(0)?,
        source_id: row.get(1)?,
        url: row.get(2)?,
        mime_type: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        embedding: blob_to_embedding(&embedding),
        crawl_session_id: row.get(7)?,
        parent_document_id: row.get(8)?,
        root_url: row.get(9)?,
        source_email_id: row.get(10)?,
        created_at: parse_timestamp(row, 11)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Little-endian f32 packing
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
