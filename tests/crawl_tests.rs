//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the document repository and
//! exercise the full crawl cycle end-to-end: batching, ledger resumption,
//! rate-limit backoff, and the bounded retry pass.

use case_harvest::config::{Config, CrawlerConfig, DelayConfig, OutputConfig, SourceConfig};
use case_harvest::crawler::CrawlOrchestrator;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Delay configuration with every pause zeroed so tests run instantly
fn fast_delays() -> DelayConfig {
    DelayConfig {
        request_min: 0.0,
        request_max: 0.0,
        rate_limit_min: 0.0,
        rate_limit_max: 0.0,
        nap_chance: 0.0,
        nap_min: 0.0,
        nap_max: 0.0,
        retry_nap_min: 0.0,
        retry_nap_max: 0.0,
        batch_break_min: 0.0,
        batch_break_max: 0.0,
        batch_cooldown: 0.0,
    }
}

/// Creates a test configuration pointed at a mock server and a temp dir
fn test_config(base_url: &str, dir: &Path, start: u64, end: u64, batch_size: u64) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_id: start,
            end_id: end,
            batch_size,
            max_retries: 3,
            max_workers: 1,
            request_timeout_secs: 5,
        },
        source: SourceConfig {
            base_url: base_url.to_string(),
            user_agent: "TestHarvester/1.0".to_string(),
        },
        delays: fast_delays(),
        output: OutputConfig {
            corpus_path: dir.join("corpus.txt").to_string_lossy().into_owned(),
            processed_path: dir.join("processed_ids.txt").to_string_lossy().into_owned(),
            failed_path: dir.join("failed_ids.txt").to_string_lossy().into_owned(),
            proxy_list_path: None,
        },
    }
}

/// A document page with a judgment section and an h1 title
fn case_page(title: &str, judgment: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <h1>{title}</h1>
        <div class="judgments"><p>{judgment}</p></div>
        </body></html>"#
    )
}

/// A document page without any judgment section
fn empty_page() -> String {
    r#"<html><body><h1>Nothing here</h1><p>No judgment on this page.</p></body></html>"#
        .to_string()
}

fn read_id_set(path: &Path) -> HashSet<u64> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim().parse().unwrap())
            .collect(),
        Err(_) => HashSet::new(),
    }
}

async fn mount_case(server: &MockServer, id: u64, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/doc/{id}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_range_with_one_empty_case() {
    let mock_server = MockServer::start().await;

    // Ids 1-4 and 6-10 have judgments; id 5 exists but has none
    for id in (1..=10).filter(|id| *id != 5) {
        mount_case(
            &mock_server,
            id,
            case_page(&format!("Case Title {id}"), &format!("Judgment body {id}")),
        )
        .await;
    }
    mount_case(&mock_server, 5, empty_page()).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path(), 1, 10, 3);
    let corpus_path = dir.path().join("corpus.txt");
    let processed_path = dir.path().join("processed_ids.txt");
    let failed_path = dir.path().join("failed_ids.txt");

    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    let stats = orchestrator.run().await.unwrap();

    // Every identifier reached Done, including the empty one
    let done = read_id_set(&processed_path);
    assert_eq!(done, (1..=10).collect::<HashSet<u64>>());
    assert!(read_id_set(&failed_path).is_empty());

    // Exactly 9 record blocks; the empty case produced none
    let corpus = std::fs::read_to_string(&corpus_path).unwrap();
    assert_eq!(corpus.matches("Case ID: ").count(), 9);
    assert!(!corpus.contains("Case ID: 5\n"));
    assert_eq!(corpus.matches(&"=".repeat(100)).count(), 18);
    assert!(corpus.contains("Title: Case Title 1\n"));
    assert!(corpus.contains("Judgment body 10"));

    assert_eq!(stats.added, 9);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_resolved_ids_issue_no_fetches() {
    let mock_server = MockServer::start().await;

    // Anything already in the ledger must never be requested again
    for id in 1..=4 {
        Mock::given(method("GET"))
            .and(path(format!("/doc/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_string(case_page("X", "Y")))
            .expect(0)
            .mount(&mock_server)
            .await;
    }
    mount_case(&mock_server, 5, case_page("Fresh Case", "Fresh judgment")).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("processed_ids.txt"), "1\n2\n3\n").unwrap();
    std::fs::write(dir.path().join("failed_ids.txt"), "4\n").unwrap();

    let config = test_config(&mock_server.uri(), dir.path(), 1, 5, 5);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    orchestrator.run_range(1, 5, 5).await.unwrap();

    let done = read_id_set(&dir.path().join("processed_ids.txt"));
    assert_eq!(done, [1, 2, 3, 5].into_iter().collect::<HashSet<u64>>());

    // The range pass never touches the failed set
    let failed = read_id_set(&dir.path().join("failed_ids.txt"));
    assert_eq!(failed, [4].into_iter().collect::<HashSet<u64>>());

    let corpus = std::fs::read_to_string(dir.path().join("corpus.txt")).unwrap();
    assert_eq!(corpus.matches("Case ID: ").count(), 1);
    assert!(corpus.contains("Case ID: 5\n"));
}

#[tokio::test]
async fn test_rate_limit_retries_exactly_once() {
    let mock_server = MockServer::start().await;

    // First request is rate limited, the retry succeeds
    Mock::given(method("GET"))
        .and(path("/doc/1/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_case(&mock_server, 1, case_page("Limited Case", "Recovered body")).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path(), 1, 1, 1);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    orchestrator.run_range(1, 1, 1).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let doc_requests = requests
        .iter()
        .filter(|request| request.url.path() == "/doc/1/")
        .count();
    assert_eq!(doc_requests, 2);

    let done = read_id_set(&dir.path().join("processed_ids.txt"));
    assert!(done.contains(&1));
    assert!(read_id_set(&dir.path().join("failed_ids.txt")).is_empty());

    let corpus = std::fs::read_to_string(dir.path().join("corpus.txt")).unwrap();
    assert!(corpus.contains("Recovered body"));
}

#[tokio::test]
async fn test_persistent_rate_limit_marks_failed() {
    let mock_server = MockServer::start().await;

    // Rate limited on both the original attempt and the single retry
    Mock::given(method("GET"))
        .and(path("/doc/1/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path(), 1, 1, 1);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    orchestrator.run_range(1, 1, 1).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let failed = read_id_set(&dir.path().join("failed_ids.txt"));
    assert!(failed.contains(&1));
    assert!(read_id_set(&dir.path().join("processed_ids.txt")).is_empty());
}

#[tokio::test]
async fn test_retry_pass_recovers_failed_cases() {
    let mock_server = MockServer::start().await;

    // Ids 7 and 8 fail once, then succeed; id 9 always fails
    for id in [7u64, 8] {
        Mock::given(method("GET"))
            .and(path(format!("/doc/{id}/")))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        mount_case(
            &mock_server,
            id,
            case_page(&format!("Recovered {id}"), &format!("Recovered body {id}")),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/doc/9/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path(), 7, 9, 5);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    let stats = orchestrator.run().await.unwrap();

    // 7 and 8 moved from failed to done; 9 remains failed after all passes
    let done = read_id_set(&dir.path().join("processed_ids.txt"));
    assert!(done.contains(&7));
    assert!(done.contains(&8));
    assert!(!done.contains(&9));

    let failed = read_id_set(&dir.path().join("failed_ids.txt"));
    assert_eq!(failed, [9].into_iter().collect::<HashSet<u64>>());

    let corpus = std::fs::read_to_string(dir.path().join("corpus.txt")).unwrap();
    assert_eq!(corpus.matches("Case ID: ").count(), 2);
    assert!(corpus.contains("Recovered body 7"));
    assert!(corpus.contains("Recovered body 8"));

    assert_eq!(stats.added, 2);
    assert_eq!(stats.recovered, 2);

    // Range pass plus three bounded retry passes
    let requests = mock_server.received_requests().await.unwrap();
    let nine_requests = requests
        .iter()
        .filter(|request| request.url.path() == "/doc/9/")
        .count();
    assert_eq!(nine_requests, 4);
}

#[tokio::test]
async fn test_restart_resumes_without_refetching() {
    // First run harvests everything
    let first_server = MockServer::start().await;
    for id in 1..=3 {
        mount_case(
            &first_server,
            id,
            case_page(&format!("Case {id}"), &format!("Body {id}")),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let config = test_config(&first_server.uri(), dir.path(), 1, 3, 3);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    orchestrator.run().await.unwrap();
    drop(orchestrator);

    // Second run over the same range must make zero requests
    let second_server = MockServer::start().await;
    for id in 1..=3 {
        Mock::given(method("GET"))
            .and(path(format!("/doc/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_string(case_page("X", "Y")))
            .expect(0)
            .mount(&second_server)
            .await;
    }

    let config = test_config(&second_server.uri(), dir.path(), 1, 3, 3);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    let stats = orchestrator.run().await.unwrap();

    assert_eq!(stats.skipped, 3);
    assert_eq!(stats.added, 0);
    assert!(second_server.received_requests().await.unwrap().is_empty());

    // No duplicate records either
    let corpus = std::fs::read_to_string(dir.path().join("corpus.txt")).unwrap();
    assert_eq!(corpus.matches("Case ID: ").count(), 3);
}

#[tokio::test]
async fn test_default_title_when_heading_missing() {
    let mock_server = MockServer::start().await;

    mount_case(
        &mock_server,
        1,
        r#"<html><body><div class="judgments">Untitled judgment text.</div></body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path(), 1, 1, 1);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    orchestrator.run_range(1, 1, 1).await.unwrap();

    let corpus = std::fs::read_to_string(dir.path().join("corpus.txt")).unwrap();
    assert!(corpus.contains("Title: Case 1\n"));
}

#[tokio::test]
async fn test_retry_with_no_failures_is_a_no_op() {
    let mock_server = MockServer::start().await;
    mount_case(&mock_server, 1, case_page("Only Case", "Only body")).await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&mock_server.uri(), dir.path(), 1, 1, 1);
    let mut orchestrator = CrawlOrchestrator::new(config).unwrap();
    orchestrator.run().await.unwrap();

    // A single request overall: the retry pass had nothing to do
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!dir.path().join("failed_ids.txt").exists());
}
