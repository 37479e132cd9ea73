use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_http::{ApiClient, ApiError, RetryPolicy};

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(40),
        max_delay: Duration::from_millis(60),
        max_jitter: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_retries_server_errors_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/patients"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .with_priority(2)
        .expect(1)
        .mount(&mock_server)
        .await;

    let policy = fast_policy();
    let client = ApiClient::new(mock_server.uri(), policy);

    let started = Instant::now();
    let result: Value = client.get("/patients", &[], None).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result, json!({"data": []}));

    // Two waits: backoff(0) + backoff(1), each plus up to max_jitter.
    assert!(elapsed >= policy.min_total_delay(2), "elapsed {:?}", elapsed);
    assert!(
        elapsed <= policy.max_total_delay(2) + Duration::from_millis(500),
        "elapsed {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_client_error_returns_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/patients/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri(), fast_policy());
    let result: Result<Value, ApiError> = client.get("/patients/42", &[], None).await;

    // expect(1) is verified when the mock server drops.
    assert_matches!(result, Err(ApiError::Status { status: 404, ref body }) if body["error"] == "not found");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "slow down"})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "1"}]})))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri(), fast_policy());
    let result: Value = client.get("/appointments", &[], None).await.unwrap();

    assert_eq!(result["data"][0]["id"], "1");
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/patients"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "maintenance"})))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri(), fast_policy());
    let result: Result<Value, ApiError> = client.get("/patients", &[], None).await;

    assert_matches!(result, Err(ApiError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_non_json_response_is_hard_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/patients"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>login</html>"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri(), fast_policy());
    let result: Result<Value, ApiError> = client.get("/patients", &[], None).await;

    assert_matches!(
        result,
        Err(ApiError::InvalidContentType { status: 200, ref content_type }) if content_type == "text/html"
    );
}

#[tokio::test]
async fn test_transport_errors_are_retried_then_surfaced() {
    // Nothing listens on this port once the listener is dropped.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let policy = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(10),
        max_jitter: Duration::ZERO,
    };
    let client = ApiClient::new(uri, policy);

    let started = Instant::now();
    let result: Result<Value, ApiError> = client.get("/patients", &[], None).await;

    assert_matches!(result, Err(ApiError::Transport(_)));
    assert!(started.elapsed() >= policy.min_total_delay(2));
}

#[tokio::test]
async fn test_sends_bearer_default_headers_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/patients"))
        .and(query_param("filter[email]", "anna@example.se"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(header("apikey", "anon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri(), RetryPolicy::no_retries())
        .with_header("apikey", "anon")
        .unwrap();

    let result: Value = client
        .get("/patients", &[("filter[email]", "anna@example.se")], Some("secret-token"))
        .await
        .unwrap();

    assert_eq!(result["data"], json!([]));
}

#[tokio::test]
async fn test_post_sends_json_body_and_accepts_no_content() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/otp"))
        .and(wiremock::matchers::body_json(json!({"email": "anna@example.se"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri(), RetryPolicy::no_retries());
    let result: Result<(), ApiError> = client
        .post("/auth/v1/otp", &json!({"email": "anna@example.se"}), None)
        .await;

    assert!(result.is_ok());
}
