//! Connector tests against a mock feed server and the memory store
//!
//! Run with:
//!
//! ```bash
//! cargo test -p blocklist-ingest --test connector_tests
//! ```

mod common;

use blocklist_ingest::{FeedOutcome, IngestConfig, IngestError};
use common::{feed, feed_body, init_test_tracing, memory_connector, mount_feed, mount_status, test_config};
use std::time::Duration;
use tokio::time::Instant;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_filters_comments_and_blanks() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", "# blocklist.de ssh\n1.2.3.4\n\n  5.6.7.8  \n# end\n").await;

    let (connector, _) = memory_connector(&test_config(&server));
    let addresses = connector.fetch(&feed("ssh")).await.unwrap();

    assert_eq!(addresses, vec!["1.2.3.4", "5.6.7.8"]);
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let server = MockServer::start().await;
    mount_status(&server, "mail", 503).await;

    let (connector, _) = memory_connector(&test_config(&server));
    let err = connector.fetch(&feed("mail")).await.unwrap_err();

    assert!(matches!(err, IngestError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_fetch_network_error() {
    let config = IngestConfig::builder()
        .feed_base_url("http://127.0.0.1:1")
        .request_timeout_secs(2)
        .rate_limit_delay_secs(0)
        .build();

    let (connector, _) = memory_connector(&config);
    let err = connector.fetch(&feed("ssh")).await.unwrap_err();

    assert!(matches!(err, IngestError::Http(_)));
}

#[tokio::test]
async fn test_fetch_single_attempt_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/ftp.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (connector, _) = memory_connector(&test_config(&server));
    assert!(connector.fetch(&feed("ftp")).await.is_err());
}

#[tokio::test]
async fn test_fetch_retries_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lists/apache.txt"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_feed(&server, "apache", "192.0.2.10\n192.0.2.11\n").await;

    let mut config = test_config(&server);
    config.feed.max_attempts = 2;

    let (connector, _) = memory_connector(&config);
    let addresses = connector.fetch(&feed("apache")).await.unwrap();

    assert_eq!(addresses.len(), 2);
}

#[tokio::test]
async fn test_fetch_pauses_after_success_and_failure() {
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", "1.2.3.4\n").await;
    mount_status(&server, "mail", 500).await;

    let mut config = test_config(&server);
    config.feed.delay_secs = 1;
    let (connector, _) = memory_connector(&config);

    let started = Instant::now();
    assert!(connector.fetch(&feed("ssh")).await.is_ok());
    assert!(started.elapsed() >= Duration::from_secs(1));

    let started = Instant::now();
    assert!(connector.fetch(&feed("mail")).await.is_err());
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_feed_probe_skips_pause() {
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", &feed_body(8)).await;

    let mut config = test_config(&server);
    config.feed.delay_secs = 30;
    let (connector, _) = memory_connector(&config);

    let started = Instant::now();
    let probe = connector.feed_client().probe(&feed("ssh")).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(probe.entries, 8);
    assert_eq!(probe.sample.len(), 5);
}

// ============================================================================
// persist
// ============================================================================

#[tokio::test]
async fn test_persist_empty_does_not_touch_store() {
    let server = MockServer::start().await;
    let (connector, store) = memory_connector(&test_config(&server));

    assert!(matches!(connector.persist(&[]).await, Err(IngestError::EmptyBatch)));
    assert_eq!(store.insert_calls().unwrap(), 0);
}

#[tokio::test]
async fn test_persist_store_failure_is_returned() {
    let server = MockServer::start().await;
    let (connector, store) = memory_connector(&test_config(&server));
    store.fail_inserts(true).unwrap();

    let docs = connector.transform(vec!["1.2.3.4".to_string()], &feed("ssh"));
    assert!(matches!(connector.persist(&docs).await, Err(IngestError::Store(_))));
    assert_eq!(store.insert_calls().unwrap(), 1);
}

// ============================================================================
// run
// ============================================================================

#[tokio::test]
async fn test_run_skips_failed_feed() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", &feed_body(7)).await;
    mount_status(&server, "mail", 500).await;

    let (connector, store) = memory_connector(&test_config(&server));
    let report = connector.run(&[feed("ssh"), feed("mail")]).await;

    assert_eq!(report.total_loaded, 7);
    assert_eq!(report.outcome(&feed("ssh")), Some(&FeedOutcome::Loaded(7)));
    assert!(matches!(report.outcome(&feed("mail")), Some(FeedOutcome::FetchFailed(_))));

    let documents = store.documents().unwrap();
    assert_eq!(documents.len(), 7);
    assert!(documents.iter().all(|d| d.category.as_str() == "ssh"));
    assert!(documents
        .iter()
        .all(|d| d.origin == format!("{}/lists/ssh.txt", server.uri())));
}

#[tokio::test]
async fn test_run_empty_feed_and_missing_feed() {
    let server = MockServer::start().await;
    mount_feed(&server, "ftp", "# nothing listed today\n\n").await;
    mount_feed(&server, "apache", "198.51.100.1\n").await;

    let (connector, store) = memory_connector(&test_config(&server));
    // bruteforcelogin has no mock, so the server answers 404
    let report = connector
        .run(&[feed("ftp"), feed("bruteforcelogin"), feed("apache")])
        .await;

    assert_eq!(report.feeds.len(), 3);
    assert_eq!(report.outcome(&feed("ftp")), Some(&FeedOutcome::Empty));
    assert!(matches!(
        report.outcome(&feed("bruteforcelogin")),
        Some(FeedOutcome::FetchFailed(_))
    ));
    assert_eq!(report.outcome(&feed("apache")), Some(&FeedOutcome::Loaded(1)));
    assert_eq!(report.total_loaded, 1);
    assert_eq!(store.insert_calls().unwrap(), 1);
}

#[tokio::test]
async fn test_run_continues_after_persist_failure() {
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", &feed_body(3)).await;

    let (connector, store) = memory_connector(&test_config(&server));
    store.fail_inserts(true).unwrap();

    let report = connector.run(&[feed("ssh"), feed("ssh")]).await;
    assert_eq!(report.total_loaded, 0);
    assert!(report
        .feeds
        .iter()
        .all(|r| matches!(r.outcome, FeedOutcome::PersistFailed(_))));
    assert_eq!(store.insert_calls().unwrap(), 2);
}

#[tokio::test]
async fn test_repeated_runs_insert_duplicates() {
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", "1.2.3.4\n").await;

    let (connector, _) = memory_connector(&test_config(&server));
    connector.run(&[feed("ssh")]).await;
    connector.run(&[feed("ssh")]).await;

    let stats = connector.statistics().await.unwrap();
    assert_eq!(stats.total_records, 2);
}

// ============================================================================
// statistics / close
// ============================================================================

#[tokio::test]
async fn test_statistics_after_run() {
    let server = MockServer::start().await;
    mount_feed(&server, "ssh", &feed_body(3)).await;
    mount_feed(&server, "ftp", &feed_body(2)).await;

    let (connector, _) = memory_connector(&test_config(&server));
    connector.run(&[feed("ssh"), feed("ftp")]).await;

    let stats = connector.statistics().await.unwrap();
    assert_eq!(stats.total_records, 5);
    assert_eq!(stats.count_for("ssh"), 3);
    assert_eq!(stats.count_for("ftp"), 2);
    assert_eq!(
        stats.to_json().unwrap(),
        r#"{"total_records":5,"by_attack_type":{"ftp":2,"ssh":3}}"#
    );
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = MockServer::start().await;
    let (mut connector, store) = memory_connector(&test_config(&server));

    connector.close().await.unwrap();
    connector.close().await.unwrap();

    assert!(store.is_closed().unwrap());
    assert!(matches!(connector.statistics().await, Err(IngestError::StoreClosed)));
}
