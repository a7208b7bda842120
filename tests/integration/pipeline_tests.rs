use crate::{mount_embeddings, mount_page, orchestrator_with, seed_source, ScrapeUrl, CRAWL_KEY};
use linkdoc_ingest::clients::CrawlResult;
use linkdoc_ingest::lineage::check_session;
use linkdoc_ingest::pipeline::LinkDepth;
use linkdoc_ingest::storage::{Document, Lineage, SqliteStorage, Storage};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_root_and_children_share_a_session() {
    let server = MockServer::start().await;
    let root_url = "http://a.test";
    let links: Vec<String> = (1..=7).map(|i| format!("http://a.test/{}", i)).collect();

    mount_page(&server, root_url, "hello", &links).await;
    for link in &links[..5] {
        mount_page(&server, link, "child content", &["http://a.test/deeper".to_string()]).await;
    }
    // Links beyond the cap must never be requested.
    for link in &links[5..] {
        Mock::given(method("POST"))
            .and(ScrapeUrl(link.clone()))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &[root_url]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");

    assert_eq!(report.processed_count(), 1);
    assert_eq!(report.children_attempted, 5);
    assert_eq!(report.children_persisted, 5);
    assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);

    let storage = orchestrator.storage();
    let root = storage
        .get_document_by_url(root_url)
        .expect("Query failed")
        .expect("Root missing");
    assert_eq!(root.title, "Title of http://a.test");
    assert_eq!(root.embedding, vec![0.1, 0.2, 0.3]);

    let session = storage
        .get_session_documents(&root.crawl_session_id)
        .expect("Query failed");
    assert_eq!(session.len(), 6);
    assert!(check_session(storage, &root.crawl_session_id)
        .expect("Query failed")
        .is_empty());
    assert!(!storage.document_exists("http://a.test/deeper").expect("Query failed"));
}

#[tokio::test]
async fn test_crawl_service_error_is_isolated() {
    let server = MockServer::start().await;
    mount_page(&server, "http://a.test", "a", &[]).await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(ScrapeUrl("http://down.test".to_string()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "http://c.test", "c", &[]).await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://a.test", "http://down.test", "http://c.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");

    assert_eq!(report.candidates, 3);
    assert_eq!(report.processed_count(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, "http://down.test");
    assert!(report.failures[0].error.contains("503"));
}

#[tokio::test]
async fn test_already_ingested_url_is_never_crawled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(ScrapeUrl("http://known.test".to_string()))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    let existing = Document::new(
        "http://known.test",
        CrawlResult {
            content: "earlier".to_string(),
            ..Default::default()
        },
        vec![1.0, 2.0, 3.0],
        Lineage::root("s0", "http://known.test"),
    );
    storage.insert_document(&existing).expect("Insert failed");
    seed_source(&mut storage, "s1", &["http://known.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");

    assert_eq!(report.candidates, 0);
    assert_eq!(orchestrator.storage().count_documents().expect("Count failed"), 1);
}

#[tokio::test]
async fn test_empty_page_creates_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, "http://empty.test", "", &["http://empty.test/1".to_string()]).await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://empty.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");

    assert_eq!(report.processed_count(), 0);
    assert_eq!(report.skipped_empty, 1);
    assert!(report.failures.is_empty());
    assert_eq!(orchestrator.storage().count_documents().expect("Count failed"), 0);
}

#[tokio::test]
async fn test_embedding_error_skips_child_only() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "http://a.test",
        "root",
        &["http://a.test/1".to_string()],
    )
    .await;
    mount_page(&server, "http://a.test/1", "child", &[]).await;

    // Vectors of the wrong size are rejected; the first call succeeds.
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}],
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://a.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");

    assert_eq!(report.processed_count(), 1);
    assert_eq!(report.children_persisted, 0);
    assert_eq!(report.failures_at(LinkDepth::Child), 1);
    assert!(report.failures[0].error.contains("slow down"));
}

#[tokio::test]
async fn test_crawl_request_carries_auth_and_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/scrape"))
        .and(header("authorization", format!("Bearer {}", CRAWL_KEY).as_str()))
        .and(wiremock::matchers::body_json(serde_json::json!({
            "url": "http://a.test",
            "includeLinks": true,
            "removeHtml": true,
            "extractImages": false,
            "maxDepth": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "body"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://a.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");
    assert_eq!(report.processed_count(), 1);

    let doc = orchestrator
        .storage()
        .get_document_by_url("http://a.test")
        .expect("Query failed")
        .expect("Document missing");
    // Missing title and mime type fall back to defaults.
    assert_eq!(doc.title, "http://a.test");
    assert_eq!(doc.mime_type, "text/html");
}

#[tokio::test]
async fn test_null_fields_from_crawl_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(ScrapeUrl("http://empty.test".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": null,
            "content": null,
            "links": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(ScrapeUrl("http://untitled.test".to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": null,
            "mime_type": null,
            "content": "body",
            "links": null
        })))
        .mount(&server)
        .await;
    mount_embeddings(&server).await;

    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");
    seed_source(&mut storage, "s1", &["http://empty.test", "http://untitled.test"]);
    let mut orchestrator = orchestrator_with(&server, storage);

    let report = orchestrator.run(50, 60).await.expect("Run failed");

    assert!(report.failures.is_empty(), "unexpected failures: {:?}", report.failures);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.processed_count(), 1);

    let storage = orchestrator.storage();
    assert!(!storage.document_exists("http://empty.test").expect("Query failed"));
    let doc = storage
        .get_document_by_url("http://untitled.test")
        .expect("Query failed")
        .expect("Document missing");
    assert_eq!(doc.title, "http://untitled.test");
    assert_eq!(doc.mime_type, "text/html");
}
