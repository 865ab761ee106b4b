//! Tests for the HTTP client module

use super::client::merge_headers;
use super::*;
use crate::error::Error;
use crate::types::{BackoffType, Method};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_client(max_retries: u32) -> HttpClient {
    let config = HttpClientConfig::builder()
        .retry(RetryPolicy::linear(max_retries, Duration::from_millis(5)))
        .build();
    HttpClient::with_config(config).unwrap()
}

fn request(server: &MockServer, route: &str) -> PageRequest {
    let url = Url::parse(&format!("{}{route}", server.uri())).unwrap();
    PageRequest::get(url)
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.backoff_type, BackoffType::Linear);
    assert!(config.rate_limit.is_none());
    assert!(config.user_agent.starts_with("api-ingest/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .rate_limit(RateLimiterConfig::per_second(2))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.backoff_type, BackoffType::Exponential);
    assert_eq!(config.retry.base_delay, Duration::from_millis(200));
    assert_eq!(config.retry.max_delay, Duration::from_secs(30));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");

    let client = HttpClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());
}

// ============================================================================
// Retry Policy Tests
// ============================================================================

#[test]
fn test_linear_delay_grows_with_attempt() {
    let policy = RetryPolicy::linear(3, Duration::from_millis(100));
    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    assert_eq!(policy.delay_for(3), Duration::from_millis(300));
}

#[test]
fn test_delay_capped_at_max() {
    let policy = RetryPolicy {
        max_retries: 10,
        base_delay: Duration::from_secs(10),
        max_delay: Duration::from_secs(25),
        backoff_type: BackoffType::Linear,
    };
    assert_eq!(policy.delay_for(5), Duration::from_secs(25));
}

#[test]
fn test_constant_and_exponential_delays() {
    let mut policy = RetryPolicy::linear(3, Duration::from_millis(100));
    policy.backoff_type = BackoffType::Constant;
    assert_eq!(policy.delay_for(3), Duration::from_millis(100));

    policy.backoff_type = BackoffType::Exponential;
    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(3), Duration::from_millis(400));
}

#[test]
fn test_page_request_query_value() {
    let req = PageRequest::get(Url::parse("https://x.test/a?page=3&q=b").unwrap());
    assert_eq!(req.query_value("page").as_deref(), Some("3"));
    assert_eq!(req.query_value("missing"), None);
}

// ============================================================================
// Transport Tests
// ============================================================================

#[tokio::test]
async fn test_send_parses_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "name": "Alice"}
        ])))
        .mount(&mock_server)
        .await;

    let client = fast_client(0);
    let response = client
        .send(&request(&mock_server, "/api/users?page=2"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body[0]["name"], "Alice");
}

#[tokio::test]
async fn test_send_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search"))
        .and(header("X-API-Key", "secret123"))
        .and(header("X-Default", "yes"))
        .and(body_json(serde_json::json!({"filter": "open"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .header("X-Default", "yes")
        .retry(RetryPolicy::none())
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let mut req = request(&mock_server, "/api/search");
    req.method = Method::POST;
    req.headers
        .insert("X-API-Key".to_string(), "secret123".to_string());
    req.body = Some(serde_json::json!({"filter": "open"}));

    let response = client.send(&req).await.unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body["ok"], true);
}

#[tokio::test]
async fn test_request_header_replaces_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .header("Accept", "text/plain")
        .retry(RetryPolicy::none())
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let mut req = request(&mock_server, "/api/items");
    req.headers
        .insert("accept".to_string(), "application/json".to_string());
    client.send(&req).await.unwrap();

    let received = mock_server.received_requests().await.unwrap();
    let accepts: Vec<_> = received[0]
        .headers
        .get_all("accept")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(accepts, vec!["application/json"]);
}

#[test]
fn test_merge_headers_overrides_and_validates() {
    let mut defaults = crate::types::StringMap::new();
    defaults.insert("X-Token".to_string(), "default".to_string());
    defaults.insert("X-Keep".to_string(), "kept".to_string());
    let mut overrides = crate::types::StringMap::new();
    overrides.insert("x-token".to_string(), "request".to_string());

    let headers = merge_headers(&defaults, &overrides).unwrap();
    assert_eq!(headers.len(), 2);
    assert_eq!(headers.get_all("x-token").iter().count(), 1);
    assert_eq!(headers["x-token"], "request");
    assert_eq!(headers["x-keep"], "kept");

    overrides.insert("bad header".to_string(), "x".to_string());
    assert!(matches!(
        merge_headers(&defaults, &overrides),
        Err(Error::InvalidConfigValue { .. })
    ));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let response = fast_client(0)
        .send(&request(&mock_server, "/api/empty"))
        .await
        .unwrap();
    assert!(response.body.is_null());
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let err = fast_client(0)
        .send(&request(&mock_server, "/api/html"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = fast_client(3)
        .send(&request(&mock_server, "/api/missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, ref body } if body == "Not found"));
}

#[tokio::test]
async fn test_too_many_requests_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = fast_client(3)
        .send(&request(&mock_server, "/api/limited"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 429, .. }));
}

#[tokio::test]
async fn test_server_error_retried_then_succeeds() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let response = fast_client(3)
        .send(&request(&mock_server, "/api/flaky"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_server_error_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let err = fast_client(2)
        .send(&request(&mock_server, "/api/always-fail"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    // Port 1 is reserved and refuses connections
    let req = PageRequest::get(Url::parse("http://127.0.0.1:1/gone").unwrap());
    let err = fast_client(1).send(&req).await.unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    assert!(err.is_retryable());
}

// ============================================================================
// Rate Limiter Tests
// ============================================================================

#[test]
fn test_rate_limiter_burst_then_blocks() {
    let limiter = RateLimiter::new(&RateLimiterConfig::new(1, 3));

    assert!(limiter.try_acquire());
    assert!(limiter.try_acquire());
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());
}

#[test]
fn test_rate_limiter_zero_clamped() {
    let limiter = RateLimiter::new(&RateLimiterConfig::new(0, 0));

    // One permit is available immediately
    tokio_test::block_on(limiter.wait());
    assert!(!limiter.try_acquire());
}
