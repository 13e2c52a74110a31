//! Benchmark cycle tests

use crate::common::{archive, host_port, page_body, test_config};
use serde_json::json;
use tidepool::proxy::{Benchmarker, ProxySet, ProxyStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_benchmark_accepts_working_proxy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/benchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BVbench", 95, "Bench")],
            1,
            1,
            1,
        )))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), "/tmp/unused.db", vec![(1, "A")]);
    let benchmarker = Benchmarker::from_config(&config.proxy);
    let store = ProxyStore::new();

    let candidate = host_port(&server.uri());
    let report = benchmarker.batch_test(vec![candidate.clone()], &store).await;

    assert_eq!(report.total, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(store.list(ProxySet::Good), vec![candidate.clone()]);

    // Every attempt satisfied the shape predicate.
    let record = store.select_best().unwrap();
    assert_eq!(record.address, candidate);
    assert!((record.success_rate - 1.0).abs() < f64::EPSILON);
    assert!(record.latency > 0.0);
}

#[tokio::test]
async fn test_benchmark_rejects_shapeless_response() {
    let server = MockServer::start().await;

    // HTTP 200, valid JSON, but the archives array is empty: the shape
    // predicate fails and the candidate must land in Bad.
    Mock::given(method("GET"))
        .and(path("/benchlist"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 0, "data": {"archives": []}})),
        )
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), "/tmp/unused.db", vec![(1, "A")]);
    let benchmarker = Benchmarker::from_config(&config.proxy);
    let store = ProxyStore::new();

    let candidate = host_port(&server.uri());
    let report = benchmarker.batch_test(vec![candidate.clone()], &store).await;

    assert_eq!(report.accepted, 0);
    assert_eq!(store.list(ProxySet::Bad), vec![candidate]);
    assert!(store.select_best().is_none());
}

#[tokio::test]
async fn test_benchmark_mixed_batch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/benchlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
            vec![archive("BVbench", 95, "Bench")],
            1,
            1,
            1,
        )))
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), "/tmp/unused.db", vec![(1, "A")]);
    let benchmarker = Benchmarker::from_config(&config.proxy);
    let store = ProxyStore::new();

    let good = host_port(&server.uri());
    let dead = "127.0.0.1:9".to_string();
    let report = benchmarker
        .batch_test(vec![good.clone(), dead.clone()], &store)
        .await;

    assert_eq!(report.total, 2);
    assert_eq!(report.accepted, 1);
    assert!(store.contains(&good, ProxySet::Good));
    assert!(store.contains(&dead, ProxySet::Bad));
}
