use crate::{http_clients, mount_embeddings, mount_page, orchestrator_with, seed_source};
use chrono::{DateTime, Utc};
use linkdoc_ingest::config::PipelineConfig;
use linkdoc_ingest::sources::{extract_links, import_messages, InboundMessage};
use linkdoc_ingest::storage::{
    Document, SourceRecord, SqliteStorage, Storage, StorageError, StorageResult,
};
use linkdoc_ingest::trigger::{handle_crawl, CrawlRequest};
use linkdoc_ingest::Orchestrator;
use wiremock::MockServer;

/// A store whose every query fails
struct UnreachableStorage;

impl Storage for UnreachableStorage {
    fn upsert_source(&mut self, _: &SourceRecord) -> StorageResult<()> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn get_source(&self, _: &str) -> StorageResult<Option<SourceRecord>> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn pending_sources_before(
        &self,
        _: DateTime<Utc>,
        _: u32,
    ) -> StorageResult<Vec<SourceRecord>> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn document_exists(&self, _: &str) -> StorageResult<bool> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn insert_document(&mut self, _: &Document) -> StorageResult<()> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn get_document(&self, _: &str) -> StorageResult<Option<Document>> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn get_document_by_url(&self, _: &str) -> StorageResult<Option<Document>> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn get_children(&self, _: &str) -> StorageResult<Vec<Document>> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn get_session_documents(&self, _: &str) -> StorageResult<Vec<Document>> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn count_sources(&self) -> StorageResult<u64> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn count_documents(&self) -> StorageResult<u64> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn count_root_documents(&self) -> StorageResult<u64> {
        Err(StorageError::Database("connection refused".to_string()))
    }
    fn count_sessions(&self) -> StorageResult<u64> {
        Err(StorageError::Database("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_trigger_reports_processed_count() {
    let server = MockServer::start().await;
    mount_page(&server, "http://a.test", "a", &["http://a.test/1".to_string()]).await;
    mount_page(&server, "http://a.test/1", "child", &[]).await;
    mount_page(&server, "http://b.test", "b", &[]).await;
    mount_embeddings(&server).await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("ingest.db");
    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://a.test", "http://b.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let request = CrawlRequest::from_body(r#"{"max_links": 10}"#).expect("Bad body");
    let response = handle_crawl(&mut orchestrator, &request, &PipelineConfig::default()).await;

    assert_eq!(response.status_code(), 200);
    assert!(response.success);
    assert_eq!(response.processed_count, Some(2));
    assert_eq!(
        response.message.as_deref(),
        Some("Successfully processed 2 links")
    );

    drop(orchestrator);
    let reopened = SqliteStorage::new(&db_path).expect("Failed to reopen DB");
    assert_eq!(reopened.count_documents().expect("Count failed"), 3);
    assert_eq!(reopened.count_root_documents().expect("Count failed"), 2);
}

#[tokio::test]
async fn test_trigger_with_nothing_to_do() {
    let server = MockServer::start().await;
    let mut orchestrator = orchestrator_with(
        &server,
        SqliteStorage::new_in_memory().expect("Failed to open DB"),
    );

    let response = handle_crawl(
        &mut orchestrator,
        &CrawlRequest::default(),
        &PipelineConfig::default(),
    )
    .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.processed_count, None);
    assert_eq!(response.message.as_deref(), Some("No new links to process"));
}

#[tokio::test]
async fn test_query_failure_fails_the_trigger() {
    let server = MockServer::start().await;
    let (crawler, embedder) = http_clients(&server, None);
    let mut orchestrator = Orchestrator::new(crawler, embedder, UnreachableStorage);

    let response = handle_crawl(
        &mut orchestrator,
        &CrawlRequest::default(),
        &PipelineConfig::default(),
    )
    .await;

    assert_eq!(response.status_code(), 500);
    assert!(!response.success);
    let error = response.error.expect("error message missing");
    assert!(error.contains("Query error"), "got: {}", error);
    assert!(error.contains("connection refused"));
}

#[tokio::test]
async fn test_imported_messages_feed_the_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "https://example.com/post", "post body", &[]).await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    let now = Utc::now();
    let messages = vec![InboundMessage {
        source_id: "msg-1".to_string(),
        received_at: now - chrono::Duration::hours(3),
        body: Some("Worth a read: https://example.com/post.".to_string()),
        links: None,
    }];
    assert_eq!(
        extract_links("Worth a read: https://example.com/post."),
        vec!["https://example.com/post"]
    );
    import_messages(&mut storage, messages, 24, now).expect("Import failed");

    let mut orchestrator = orchestrator_with(&server, storage);
    let response = handle_crawl(
        &mut orchestrator,
        &CrawlRequest::default(),
        &PipelineConfig::default(),
    )
    .await;

    assert_eq!(response.processed_count, Some(1));
    let doc = orchestrator
        .storage()
        .get_document_by_url("https://example.com/post")
        .expect("Query failed")
        .expect("Document missing");
    assert_eq!(doc.source_id, "msg-1");
    assert_eq!(doc.source_email_id, "msg-1");
}

#[tokio::test]
async fn test_wrong_vector_size_fails_the_link_not_the_run() {
    let server = MockServer::start().await;
    mount_page(&server, "http://a.test", "a", &[]).await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://a.test"]);
    let (crawler, embedder) = http_clients(&server, Some(4));
    let mut orchestrator = Orchestrator::new(crawler, embedder, storage);

    let response = handle_crawl(
        &mut orchestrator,
        &CrawlRequest::default(),
        &PipelineConfig::default(),
    )
    .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.processed_count, Some(0));
    assert_eq!(orchestrator.storage().count_documents().expect("Count failed"), 0);
}
