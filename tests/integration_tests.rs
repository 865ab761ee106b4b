//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: fetch config → paged HTTP requests → records → schema

use api_ingest::fetcher::{FetchProgress, FetchStatus, PaginatedFetcher};
use api_ingest::http::{HttpClient, HttpClientConfig, RetryPolicy};
use api_ingest::pagination::StopReason;
use api_ingest::schema::{FieldType, SchemaAnalyzer, StorageType};
use api_ingest::{ingest, load_fetch_config, Error, ErrorKind, FetchConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_fetcher(max_retries: u32) -> PaginatedFetcher {
    let config = HttpClientConfig::builder()
        .retry(RetryPolicy::linear(max_retries, Duration::from_millis(5)))
        .build();
    PaginatedFetcher::new(Arc::new(HttpClient::with_config(config).unwrap()))
}

fn users(count: usize, first_id: usize) -> Value {
    let records: Vec<Value> = (first_id..first_id + count)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("user {id}"),
                "email": format!("user{id}@example.com"),
            })
        })
        .collect();
    Value::Array(records)
}

fn paged(url: String, page_size: u32) -> FetchConfig {
    FetchConfig::new(url)
        .with_page_pagination("page", 1)
        .with_page_size(page_size)
        .with_inter_page_delay(Duration::ZERO)
}

// ============================================================================
// Pagination Over HTTP
// ============================================================================

#[tokio::test]
async fn test_fetch_all_pages_until_short_page() {
    let mock_server = MockServer::start().await;

    for (page, count) in [("1", 20), ("2", 20), ("3", 7)] {
        let first_id = (page.parse::<usize>().unwrap() - 1) * 20;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("page", page))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(users(count, first_id)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = paged(format!("{}/users", mock_server.uri()), 20);
    let result = fast_fetcher(0).fetch_all(&config).await.unwrap();

    assert_eq!(result.fetched_records(), 47);
    assert_eq!(result.total_records, 47);
    assert_eq!(result.pages_processed, 3);
    assert_eq!(result.total_pages, 3);
    assert_eq!(result.stop_reason, StopReason::ShortPage);
    assert_eq!(result.all_records[0]["id"], 0);
    assert_eq!(result.all_records[46]["id"], 46);
}

#[tokio::test]
async fn test_embedded_filters_sent_on_every_page() {
    let mock_server = MockServer::start().await;

    for (page, count) in [("1", 3), ("2", 3), ("3", 1)] {
        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(query_param("userId", "1"))
            .and(query_param("_limit", "3"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_json(users(count, 0)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = paged(format!("{}/posts?userId=1&_limit=3", mock_server.uri()), 3)
        .with_size_field(Some("_limit"));
    let result = fast_fetcher(0).fetch_all(&config).await.unwrap();

    assert_eq!(result.fetched_records(), 7);
    assert_eq!(result.pages_processed, 3);

    // _limit is already in the URL, so it is never sent twice
    for request in mock_server.received_requests().await.unwrap() {
        let limits = request
            .url
            .query_pairs()
            .filter(|(key, _)| key == "_limit")
            .count();
        assert_eq!(limits, 1);
    }
}

#[tokio::test]
async fn test_envelope_with_total_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": users(2, 0),
            "meta": {"total": "4"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": users(2, 2),
            "meta": {"total": "4"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "meta": {"total": "4"}
        })))
        .mount(&mock_server)
        .await;

    let config =
        paged(format!("{}/items", mock_server.uri()), 2).with_total_field("meta.total");
    let result = fast_fetcher(0).fetch_all(&config).await.unwrap();

    assert_eq!(result.fetched_records(), 4);
    assert_eq!(result.total_records, 4);
    assert_eq!(result.stop_reason, StopReason::EmptyPage);
}

#[tokio::test]
async fn test_pagination_disabled_single_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(50, 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FetchConfig::new(format!("{}/users", mock_server.uri()));
    let result = fast_fetcher(0).fetch_all(&config).await.unwrap();

    assert_eq!(result.fetched_records(), 50);
    assert_eq!(result.stop_reason, StopReason::PaginationDisabled);
}

// ============================================================================
// Failure Handling
// ============================================================================

#[tokio::test]
async fn test_client_error_fails_fast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(10, 0)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = paged(format!("{}/users", mock_server.uri()), 10);
    let err = fast_fetcher(3).fetch_all(&config).await.unwrap_err();

    match err {
        Error::RequestRejected { page, status, .. } => {
            assert_eq!(page, 2);
            assert_eq!(status, 403);
        }
        other => panic!("expected RequestRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_retried_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users(5, 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FetchConfig::new(format!("{}/users", mock_server.uri()));
    let result = fast_fetcher(3).fetch_all(&config).await.unwrap();

    assert_eq!(result.fetched_records(), 5);
}

#[tokio::test]
async fn test_server_error_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let errors: Arc<Mutex<Vec<FetchProgress>>> = Arc::default();
    let sink = Arc::clone(&errors);
    let fetcher = fast_fetcher(2).with_progress(move |progress: &FetchProgress| {
        if progress.status == FetchStatus::Error {
            sink.lock().unwrap().push(progress.clone());
        }
    });

    let config = FetchConfig::new(format!("{}/users", mock_server.uri()));
    let err = fetcher.fetch_all(&config).await.unwrap_err();

    assert!(matches!(err, Error::PageFailed { page: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(errors.lock().unwrap().len(), 1);
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[tokio::test]
async fn test_ingest_infers_schema() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": 1, "name": "Ada", "balance": 10.5, "address": {"city": "London"}},
                {"id": 2, "name": "Grace", "balance": 3.25, "active": true}
            ]
        })))
        .mount(&mock_server)
        .await;

    let config = paged(format!("{}/users", mock_server.uri()), 10);
    let analyzer = SchemaAnalyzer::for_session("Users-2024");

    let report = ingest(&fast_fetcher(0), &config, &analyzer).await.unwrap();

    assert_eq!(report.table_name, "session_users_2024");
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.stop_reason, StopReason::ShortPage);

    let schema = &report.schema;
    assert_eq!(
        schema.field_names(),
        vec!["active", "address_city", "balance", "id", "name"]
    );

    let id = schema.field("id").unwrap();
    assert_eq!(id.field_type, FieldType::Integer);
    assert_eq!(id.storage_type, StorageType::BigInt);
    assert!(!id.nullable);

    let name = schema.field("name").unwrap();
    assert_eq!(name.storage_type, StorageType::Varchar(255));

    let balance = schema.field("balance").unwrap();
    assert_eq!(balance.field_type, FieldType::Number);
    assert_eq!(
        balance.storage_type,
        StorageType::Decimal {
            precision: 4,
            scale: 2
        }
    );

    assert!(schema.field("address_city").unwrap().nullable);
    assert!(schema.field("active").unwrap().nullable);
}

#[tokio::test]
async fn test_ingest_empty_result_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = paged(format!("{}/users", mock_server.uri()), 10);
    let analyzer = SchemaAnalyzer::for_session("empty");

    let err = ingest(&fast_fetcher(0), &config, &analyzer)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyInput { .. }));
}

#[tokio::test]
async fn test_yaml_config_drives_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"rows": users(2, 0)}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/results"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payload": {"rows": users(1, 2)}
        })))
        .mount(&mock_server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write!(
        file,
        "apiUrl: {}/results\nenablePagination: true\npaginationType: offset\npageField: offset\npageSize: 2\ndataPath: payload.rows\ninterPageDelayMs: 0\n",
        mock_server.uri()
    )
    .unwrap();

    let config = load_fetch_config(file.path()).unwrap();
    let result = fast_fetcher(0).fetch_all(&config).await.unwrap();

    assert_eq!(result.fetched_records(), 3);
    assert_eq!(result.pages_processed, 2);
    assert_eq!(result.all_records[2]["id"], 2);
}
