//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock Bugzilla and Gerrit servers and
//! test the full crawl cycle end-to-end, from configuration to sinks.

use issue_trawler::config::{
    Config, CrawlConfig, OutputConfig, SourceConfig, SourceKind, UserAgentConfig,
};
use issue_trawler::crawler::{run_crawl, CrawlMode};
use issue_trawler::storage::{DocumentStore, SqliteStore};
use issue_trawler::units::{load_units, WorkUnit};
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing to both sinks under `dir`
fn create_test_config(kind: SourceKind, url: String, step: usize, dir: &Path) -> Config {
    Config {
        source: SourceConfig {
            kind,
            url,
            further_params: None,
            page_size: step,
            start_point_increase: step,
            before: None,
            after: None,
        },
        login: None,
        crawl: CrawlConfig {
            mode: "no-op".to_string(),
            workers: 2,
            unit_list: None,
            units: None,
        },
        output: OutputConfig {
            folder: Some(dir.join("out")),
            database_path: Some(dir.join("trawl.db")),
            separator: ",".to_string(),
            commit_buckets: 10,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_email: "test@example.com".to_string(),
        },
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Neither the database file nor the output folder may exist
fn assert_no_sinks_touched(dir: &Path) {
    assert!(!dir.join("trawl.db").exists(), "database was created");
    assert!(!dir.join("out").exists(), "output folder was created");
}

/// Mounts a three-bug listing (pages of two) ending in an empty page
async fn mount_bug_listing(server: &MockServer) {
    let pages = [
        ("0", json!({"bugs": [{"id": 1, "summary": "crash"}, {"id": 2, "summary": "hang"}]})),
        ("2", json!({"bugs": [{"id": 3, "summary": "typo"}]})),
        ("4", json!({"bugs": []})),
    ];

    for (offset, body) in pages {
        Mock::given(method("GET"))
            .and(path("/rest/bug"))
            .and(query_param("limit", "2"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Mounts the comment endpoint of `id` with `count` comments
async fn mount_comments(server: &MockServer, id: u64, count: usize) {
    let comments: Vec<_> = (0..count)
        .map(|n| json!({"bug_id": id, "count": n, "text": format!("comment {}", n)}))
        .collect();
    let mut bugs = serde_json::Map::new();
    bugs.insert(id.to_string(), json!({ "comments": comments }));

    Mock::given(method("GET"))
        .and(path(format!("/rest/bug/{}/comment", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bugs": bugs })))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts one Gerrit page for `owner` at start point `start`
async fn mount_changes(server: &MockServer, owner: &str, start: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path("/changes/"))
        .and(query_param("q", format!("owner:{}", owner).as_str()))
        .and(query_param("S", start))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn gerrit_body(changes: serde_json::Value) -> String {
    format!(")]}}'\n{}", changes)
}

#[tokio::test]
async fn test_bugzilla_parallel_both() {
    let server = MockServer::start().await;
    mount_bug_listing(&server).await;
    mount_comments(&server, 1, 2).await;
    mount_comments(&server, 2, 0).await;
    mount_comments(&server, 3, 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        SourceKind::Bugzilla,
        format!("{}/rest/", server.uri()),
        2,
        dir.path(),
    );

    let report = run_crawl(config, "hash".to_string(), Some(CrawlMode::ParallelBoth), None)
        .await
        .expect("crawl should succeed");

    assert_eq!(report.units_total, 3);
    assert_eq!(report.units_visited, 3);
    assert!(report.is_clean(), "unexpected failures: {:?}", report);

    let store = SqliteStore::new(&dir.path().join("trawl.db")).unwrap();
    assert_eq!(store.count("BugIDs").unwrap(), 3);
    assert_eq!(store.count("BugsData").unwrap(), 3);
    assert_eq!(store.count("Comments").unwrap(), 3);

    let run = store.get_latest_run().unwrap().expect("run recorded");
    assert_eq!(run.mode, "parallel-both");
    assert_eq!(run.status.to_db_string(), "completed");

    let out = dir.path().join("out");
    assert_eq!(read_lines(&out.join("bugIDList.csv")), vec!["1", "2", "3"]);
    assert_eq!(read_lines(&out.join("bugsData.txt")).len(), 3);
    assert_eq!(read_lines(&out.join("Bugzilla_Comments.txt")).len(), 3);
    assert_eq!(
        load_units(&out.join("bugIDList.json")).unwrap(),
        vec![WorkUnit::Id(1), WorkUnit::Id(2), WorkUnit::Id(3)]
    );
}

#[tokio::test]
async fn test_bugzilla_detail_only_resumes_from_artifact() {
    let server = MockServer::start().await;
    mount_bug_listing(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        SourceKind::Bugzilla,
        format!("{}/rest/", server.uri()),
        2,
        dir.path(),
    );

    let listing = run_crawl(
        config.clone(),
        "hash".to_string(),
        Some(CrawlMode::UnitsOnly),
        None,
    )
    .await
    .unwrap();
    assert_eq!(listing.units_total, 0);

    mount_comments(&server, 1, 1).await;
    mount_comments(&server, 2, 1).await;
    mount_comments(&server, 3, 1).await;

    let artifact = dir.path().join("out").join("bugIDList.json");
    let report = run_crawl(
        config,
        "hash".to_string(),
        Some(CrawlMode::DetailOnly),
        Some(&artifact),
    )
    .await
    .unwrap();

    assert_eq!(report.units_visited, 3);
    let comments = read_lines(&dir.path().join("out").join("Bugzilla_Comments.txt"));
    let bug_ids: Vec<u64> = comments
        .iter()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["bug_id"].as_u64().unwrap())
        .collect();
    assert_eq!(bug_ids, vec![1, 2, 3], "sequential mode keeps unit order");
}

#[tokio::test]
async fn test_failed_unit_does_not_stop_the_others() {
    let server = MockServer::start().await;
    mount_comments(&server, 1, 1).await;
    Mock::given(method("GET"))
        .and(path("/rest/bug/2/comment"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_comments(&server, 3, 1).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        SourceKind::Bugzilla,
        format!("{}/rest/", server.uri()),
        2,
        dir.path(),
    );
    config.crawl.units = Some(vec![WorkUnit::Id(1), WorkUnit::Id(2), WorkUnit::Id(3)]);

    let report = run_crawl(
        config,
        "hash".to_string(),
        Some(CrawlMode::ParallelDetailOnly),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.units_visited, 3);
    assert_eq!(report.unit_failures.len(), 1);
    assert_eq!(report.unit_failures[0].unit, WorkUnit::Id(2));

    let store = SqliteStore::new(&dir.path().join("trawl.db")).unwrap();
    assert_eq!(store.count("Comments").unwrap(), 2);
}

#[tokio::test]
async fn test_gerrit_pagination_and_routing() {
    let server = MockServer::start().await;

    mount_changes(
        &server,
        "alice",
        "0",
        200,
        gerrit_body(json!([
            {"id": "c1", "owner": {"_account_id": 1000013}},
            {"id": "c2", "owner": {"_account_id": 1000013}, "_more_changes": true}
        ])),
    )
    .await;
    mount_changes(
        &server,
        "alice",
        "2",
        200,
        gerrit_body(json!([{"id": "c3", "owner": {"_account_id": 1000013}}])),
    )
    .await;
    mount_changes(&server, "carol", "0", 200, gerrit_body(json!([]))).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        SourceKind::Gerrit,
        format!("{}/changes/", server.uri()),
        2,
        dir.path(),
    );
    config.crawl.units = Some(vec![WorkUnit::from("alice"), WorkUnit::from("carol")]);

    let report = run_crawl(
        config,
        "hash".to_string(),
        Some(CrawlMode::ParallelDetailOnly),
        None,
    )
    .await
    .unwrap();
    assert!(report.is_clean(), "unexpected failures: {:?}", report);

    let store = SqliteStore::new(&dir.path().join("trawl.db")).unwrap();

    let commits = store.find_all("id3").unwrap();
    assert_eq!(commits.len(), 3);
    assert!(commits.iter().all(|c| !c.contains_key("_more_changes")));

    let devs = store.find_all("allDevs").unwrap();
    assert_eq!(devs.len(), 1);
    assert_eq!(devs[0]["author"], json!("alice"));
    assert_eq!(devs[0]["user-id"], json!(1000013));
    assert_eq!(devs[0]["commits"], json!(3));
    assert_eq!(devs[0]["active"], json!(true));

    let out = dir.path().join("out");
    assert_eq!(read_lines(&out.join("noCommitsUser.csv")), vec!["carol,true"]);
    assert_eq!(read_lines(&out.join("allDevs.csv")), vec!["alice,1000013,3,true"]);
    assert_eq!(read_lines(&out.join("id3.csv")).len(), 3);
}

#[tokio::test]
async fn test_gerrit_inactive_account_is_resolved() {
    let server = MockServer::start().await;

    mount_changes(
        &server,
        "bob",
        "0",
        400,
        "Account 'bob' is inactive. Did you mean the following exact account?\n\
         1000024: Bob Builder <bob@example.org>\n"
            .to_string(),
    )
    .await;
    mount_changes(
        &server,
        "1000024",
        "0",
        200,
        gerrit_body(json!([{"id": "c9", "owner": {"_account_id": 1000024}}])),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        SourceKind::Gerrit,
        format!("{}/changes/", server.uri()),
        2,
        dir.path(),
    );
    config.crawl.units = Some(vec![WorkUnit::from("bob")]);

    let report = run_crawl(config, "hash".to_string(), Some(CrawlMode::DetailOnly), None)
        .await
        .unwrap();
    assert!(report.is_clean(), "unexpected failures: {:?}", report);

    let store = SqliteStore::new(&dir.path().join("trawl.db")).unwrap();
    assert_eq!(store.count("id4").unwrap(), 1);

    let devs = store.find_all("allDevs").unwrap();
    assert_eq!(devs[0]["author"], json!("bob"));
    assert_eq!(devs[0]["user-id"], json!(1000024));
    assert_eq!(devs[0]["active"], json!(false));
}

#[tokio::test]
async fn test_detail_only_without_units_is_missing_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        SourceKind::Bugzilla,
        format!("{}/rest/", server.uri()),
        2,
        dir.path(),
    );

    let err = run_crawl(config, "hash".to_string(), Some(CrawlMode::DetailOnly), None)
        .await
        .unwrap_err();
    assert!(err.is_missing_input());
    assert_no_sinks_touched(dir.path());
}

#[tokio::test]
async fn test_gerrit_listing_mode_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        SourceKind::Gerrit,
        format!("{}/changes/", server.uri()),
        2,
        dir.path(),
    );

    let err = run_crawl(config, "hash".to_string(), Some(CrawlMode::UnitsOnly), None)
        .await
        .unwrap_err();
    assert!(matches!(err, issue_trawler::TrawlError::InvalidArgument(_)));
    assert_no_sinks_touched(dir.path());
}

#[tokio::test]
async fn test_no_op_mode_uses_configured_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        SourceKind::Bugzilla,
        format!("{}/rest/", server.uri()),
        2,
        dir.path(),
    );

    let report = run_crawl(config, "hash".to_string(), None, None).await.unwrap();
    assert_eq!(report.mode, "no-op");
    assert_eq!(report.units_visited, 0);
    assert_no_sinks_touched(dir.path());
}
