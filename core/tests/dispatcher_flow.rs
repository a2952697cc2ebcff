use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orderstorm_core::{run_flood, ApiCall, FloodConfig, HttpClient, OrderSynthesizer};

fn fast_config(server: &MockServer, total: u64, concurrency: usize) -> FloodConfig {
    FloodConfig {
        webhook_url: format!("{}/webhooks/test/orders/create", server.uri()),
        total,
        // 1ms between jobs keeps the test quick while still exercising the ticker.
        rate_per_minute: 60_000,
        concurrency,
        timeout_secs: 5,
        report_interval_secs: 1,
    }
}

/// All sends succeed: every job gets exactly one request with the webhook
/// signature headers, and the final stats add up.
#[tokio::test]
async fn test_flood_all_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/test/orders/create"))
        .and(header("X-Shopify-Topic", "orders/create"))
        .and(header("X-Shopify-Hmac-SHA256", "test-signature"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(10)
        .mount(&server)
        .await;

    let config = fast_config(&server, 10, 2);
    let report = run_flood(
        &config,
        Arc::new(OrderSynthesizer::default()),
        Arc::new(AtomicBool::new(false)),
    )
    .await;

    assert_eq!(report.snapshot.total, 10);
    assert_eq!(report.snapshot.success, 10);
    assert_eq!(report.snapshot.failed, 0);

    server.verify().await;
}

/// Non-2xx responses count as failures; the invariant total == success +
/// failed holds once the pool has drained.
#[tokio::test]
async fn test_flood_counts_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/webhooks/test/orders/create"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = fast_config(&server, 6, 3);
    let report = run_flood(
        &config,
        Arc::new(OrderSynthesizer::default()),
        Arc::new(AtomicBool::new(false)),
    )
    .await;

    assert_eq!(report.snapshot.total, 6);
    assert_eq!(report.snapshot.success, 0);
    assert_eq!(report.snapshot.failed, 6);
    assert_eq!(
        report.snapshot.total,
        report.snapshot.success + report.snapshot.failed
    );
}

/// A pre-set cancellation flag stops the generator before it emits anything.
#[tokio::test]
async fn test_cancel_stops_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = fast_config(&server, 1_000, 2);
    let report = run_flood(
        &config,
        Arc::new(OrderSynthesizer::default()),
        Arc::new(AtomicBool::new(true)),
    )
    .await;

    assert_eq!(report.snapshot.total, 0);
    server.verify().await;
}

/// The shared call helper always reads the body to completion, success or
/// failure, so pooled connections are never left half-read.
#[tokio::test]
async fn test_call_reads_full_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![7u8; 2048], "application/octet-stream"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw(vec![7u8; 512], "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_secs(5));

    let ok = client
        .call(&ApiCall::get(format!("{}/blob", server.uri())))
        .await
        .unwrap();
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body.len(), 2048);

    // Failure outcomes drain too.
    let not_found = client
        .call(&ApiCall::get(format!("{}/missing", server.uri())))
        .await
        .unwrap();
    assert_eq!(not_found.status, 404);
    assert_eq!(not_found.body.len(), 512);
    assert!(!not_found.is_success());
}

/// Generation pacing: at 60k/min the ticker emits every millisecond, so a
/// small batch completes promptly while cancel remains observable per tick.
#[tokio::test]
async fn test_flood_completes_within_pacing_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = fast_config(&server, 50, 4);
    let start = std::time::Instant::now();
    let report = run_flood(
        &config,
        Arc::new(OrderSynthesizer::default()),
        Arc::new(AtomicBool::new(false)),
    )
    .await;

    assert_eq!(report.snapshot.total, 50);
    // 50 jobs at 1ms spacing is ~50ms of generation; the run can't finish
    // faster than the ticker allows, and CI gets a wide upper margin.
    assert!(report.elapsed >= Duration::from_millis(40));
    assert!(start.elapsed() < Duration::from_secs(10));
}
