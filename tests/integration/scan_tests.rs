//! Region scanner tests

use crate::common::{archive, page_body, test_config};
use tidepool::crawler::run_scan;
use tidepool::proxy::ProxyStore;
use tidepool::storage::{CatalogStorage, SqliteStorage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_scan_records_region_totals() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BV1", 1, "A")],
            104,
            1,
            1,
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/newlist"))
        .and(query_param("rid", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(vec![], 0, 1, 1)))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), "/tmp/unused.db", vec![(1, "A"), (2, "B")]);

    // Empty store: the scanner runs without a proxy, hitting the endpoint
    // directly.
    let store = ProxyStore::new();
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    run_scan(&config, &store, &mut storage).await.unwrap();

    let stats = storage.list_region_stats().unwrap();
    assert_eq!(stats.len(), 2);

    assert_eq!(stats[0].tid, 1);
    assert_eq!(stats[0].videos, 104);
    assert_eq!(stats[0].pages, 3); // ceil(104 / 50)

    assert_eq!(stats[1].tid, 2);
    assert_eq!(stats[1].videos, 0);
    assert_eq!(stats[1].pages, 0);
}
