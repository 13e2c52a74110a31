//! End-to-end crawl tests

use crate::common::{archive, host_port, page_body, test_config};
use serde_json::json;
use tidepool::crawler::crawl;
use tidepool::storage::{CatalogStorage, SqliteStorage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts the candidate source and benchmark target on the mock server,
/// advertising the server itself — under two spellings — as the forward
/// proxies, so a replacement exists after one gets dropped.
async fn mount_proxy_plumbing(server: &MockServer) {
    let proxy_address = host_port(&server.uri());
    let port = proxy_address
        .rsplit(':')
        .next()
        .expect("mock server address has a port");

    Mock::given(method("GET"))
        .and(path("/proxies"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"["{}", "localhost:{}"]"#,
            proxy_address, port
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/benchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BVbench", 95, "Bench")],
            1,
            1,
            1,
        )))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_two_regions() {
    let server = MockServer::start().await;
    mount_proxy_plumbing(&server).await;

    // Region 1: two full pages, then empty. Region 2: empty from the start.
    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .and(query_param("pn", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BV1", 1, "A"), archive("BV2", 1, "A")],
            4,
            1,
            50,
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .and(query_param("pn", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BV3", 1, "A"), archive("BV4", 1, "A")],
            4,
            2,
            50,
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .and(query_param("pn", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![], 4, 3, 50)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![], 0, 1, 50)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.db");
    let config = test_config(
        &server.uri(),
        db_path.to_str().unwrap(),
        vec![(1, "A"), (2, "B")],
    );

    tokio::time::timeout(std::time::Duration::from_secs(60), crawl(config))
        .await
        .expect("crawl timed out")
        .expect("crawl failed");

    // All four records landed, keyed by bvid.
    let storage = SqliteStorage::new(&db_path).expect("failed to reopen db");
    assert_eq!(storage.count_videos().unwrap(), 4);
    assert_eq!(storage.count_videos_in_region(1).unwrap(), 4);
    assert_eq!(storage.count_videos_in_region(2).unwrap(), 0);
}

#[tokio::test]
async fn test_crawl_redelivers_after_network_error() {
    let server = MockServer::start().await;
    mount_proxy_plumbing(&server).await;

    // (1, 1) answers with a protocol failure once, then succeeds: the task
    // must be redelivered (through a fresh proxy) rather than skipped.
    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .and(query_param("pn", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": -352,
            "message": "risk control",
            "data": {"archives": [], "page": {"count": -1, "num": 1, "size": 50}}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .and(query_param("pn", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BV1", 1, "A")],
            1,
            1,
            50,
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .and(query_param("pn", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![], 1, 2, 50)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("requeue.db");
    let config = test_config(&server.uri(), db_path.to_str().unwrap(), vec![(1, "A")]);

    tokio::time::timeout(std::time::Duration::from_secs(60), crawl(config))
        .await
        .expect("crawl timed out")
        .expect("crawl failed");

    let storage = SqliteStorage::new(&db_path).expect("failed to reopen db");
    assert_eq!(storage.count_videos().unwrap(), 1);
}
