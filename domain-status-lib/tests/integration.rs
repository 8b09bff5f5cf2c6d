// domain-status-lib/tests/integration.rs

//! Integration tests against a local mock of the NP DNS API

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, TimeZone};
use domain_status_lib::{
    sign, AvailabilityStatus, ClientConfig, Credentials, DomainApiError, DomainQuery,
    DomainStatusClient, DOMAINS_INFO_PATH, DOMAIN_CHECK_PATH,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

/// One request as seen by the mock server
#[derive(Debug, Clone)]
struct Recorded {
    path: &'static str,
    headers: HashMap<String, String>,
    domain: Option<String>,
    body: Option<Value>,
    received_at: Instant,
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn header_snapshot(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

async fn domains_info(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(Recorded {
        path: DOMAINS_INFO_PATH,
        headers: header_snapshot(&headers),
        domain: None,
        body: Some(body.clone()),
        received_at: Instant::now(),
    });

    let domains: Vec<String> = body["domains"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|d| d.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    if domains.iter().any(|d| d.starts_with("denied.")) {
        return Json(json!({"resStatus": 403, "resMsg": "sign invalid"})).into_response();
    }

    let infos: Vec<Value> = domains
        .iter()
        .map(|d| {
            json!({
                "domain": d,
                "status": 1,
                "status_desc": "online",
                "owner": "alice",
                "authorizer": ["alice", "bob"]
            })
        })
        .collect();

    Json(json!({
        "resStatus": 200,
        "resMsg": "ok",
        "data": {"count": infos.len().to_string(), "infos": infos}
    }))
    .into_response()
}

async fn domain_check(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let domain = params.get("domain").cloned().unwrap_or_default();
    state.requests.lock().unwrap().push(Recorded {
        path: DOMAIN_CHECK_PATH,
        headers: header_snapshot(&headers),
        domain: Some(domain.clone()),
        body: None,
        received_at: Instant::now(),
    });

    match domain.split('.').next().unwrap_or_default() {
        "free" | "a" => Json(json!({"resStatus": 200, "data": {"status": -1, "msg": "unregistered"}}))
            .into_response(),
        "taken" | "b" => Json(json!({"resStatus": 200, "data": {"status": 1, "msg": "dns bound"}}))
            .into_response(),
        "merchant" => Json(json!({"resStatus": 200, "data": {"status": 2, "msg": "merchant"}}))
            .into_response(),
        "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        "garbled" => (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => Json(json!({"resStatus": 400, "resMsg": "bad request"})).into_response(),
    }
}

/// Start the mock on an ephemeral port and return its state and base URL.
async fn spawn_mock() -> (Arc<MockState>, String) {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route(DOMAINS_INFO_PATH, post(domains_info))
        .route(DOMAIN_CHECK_PATH, get(domain_check))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (state, format!("http://{}", addr))
}

fn credentials() -> Credentials {
    Credentials::new("xhq", "alice.ops", "s3cr3t").unwrap()
}

fn client_for(base_url: &str) -> DomainStatusClient {
    let config = ClientConfig::default()
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5));
    DomainStatusClient::new(credentials(), config).unwrap()
}

fn domains(names: &[&str]) -> Vec<String> {
    names.iter().map(|d| d.to_string()).collect()
}

#[tokio::test]
async fn test_every_request_carries_signed_headers() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    assert_ok!(client.lookup_domains(&DomainQuery::new(["jd.local"])).await);
    assert_ok!(client.check_availability("free.jd.local").await);

    let requests = state.requests();
    assert_eq!(requests.len(), 2);

    for request in &requests {
        let headers = &request.headers;
        assert_eq!(headers["appcode"], "xhq");
        assert_eq!(headers["erp"], "alice.ops");
        assert_eq!(headers["content-type"], "application/json");
        assert!(!headers.values().any(|v| v.contains("s3cr3t")));

        // The signature must match the timestamp sent with it.
        let timestamp: i64 = headers["timestamp"].parse().unwrap();
        let instant = Local.timestamp_opt(timestamp, 0).unwrap();
        assert_eq!(headers["sign"], sign("alice.ops", "s3cr3t", &instant));
        assert_eq!(headers["sign"].len(), 32);
    }
}

#[tokio::test]
async fn test_lookup_sends_one_request_for_all_domains() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let query = DomainQuery::new(["graycluster-bind-check.jd.local", "jd.local"])
        .with_filter("primary", "");
    let result = assert_ok!(client.lookup_domains(&query).await);

    assert_eq!(result.count, 2);
    assert_eq!(result.infos.len(), 2);
    assert_eq!(result.infos[0].domain, "graycluster-bind-check.jd.local");
    assert_eq!(result.infos[0].status.as_deref(), Some("1"));
    assert_eq!(result.infos[1].authorizer, vec!["alice", "bob"]);

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, DOMAINS_INFO_PATH);
    assert_eq!(
        requests[0].body,
        Some(json!({
            "domains": ["graycluster-bind-check.jd.local", "jd.local"],
            "primary": ""
        }))
    );
}

#[tokio::test]
async fn test_lookup_application_error() {
    let (_state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let err = assert_err!(client.lookup_domains(&DomainQuery::new(["denied.jd.local"])).await);
    assert_eq!(err, DomainApiError::application(403, "sign invalid"));
}

#[tokio::test]
async fn test_check_availability_outcomes() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let free = assert_ok!(client.check_availability("free.jd.local").await);
    assert!(free.is_available());
    assert_eq!(free.status, -1);
    assert_eq!(free.message, "unregistered");

    let taken = assert_ok!(client.check_availability("taken.jd.local").await);
    assert!(!taken.is_available());
    assert_eq!(taken.classification(), AvailabilityStatus::DnsBound);

    let merchant = assert_ok!(client.check_availability("merchant.jd.local").await);
    assert!(!merchant.is_available());
    assert_eq!(merchant.status, 2);

    let domains_seen: Vec<_> = state.requests().into_iter().filter_map(|r| r.domain).collect();
    assert_eq!(
        domains_seen,
        vec!["free.jd.local", "taken.jd.local", "merchant.jd.local"]
    );
}

#[tokio::test]
async fn test_check_http_500_is_transport_error() {
    let (_state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let err = assert_err!(client.check_availability("boom.jd.local").await);
    assert!(err.is_transport());
    assert_eq!(err.http_status(), Some(500));
    match err {
        DomainApiError::Transport { body, .. } => {
            assert_eq!(body.as_deref(), Some("upstream exploded"));
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_application_error() {
    let (_state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let err = assert_err!(client.check_availability("bad.jd.local").await);
    assert_eq!(err, DomainApiError::application(400, "bad request"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_check_malformed_envelope() {
    let (_state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let err = assert_err!(client.check_availability("garbled.jd.local").await);
    assert!(err.is_transport());
    assert!(err.to_string().contains("malformed response envelope"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind and drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr));
    let err = assert_err!(client.check_availability("free.jd.local").await);
    assert!(err.is_transport());
    assert_eq!(err.http_status(), None);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_empty_batch_sends_nothing() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    assert!(client.check_availability_batch(&[]).await.is_empty());
    assert!(state.requests().is_empty());
}

#[tokio::test]
async fn test_batch_keeps_order_and_paces_requests() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let input = domains(&["taken.jd.local", "free.jd.local", "merchant.jd.local"]);
    let results = client.check_availability_batch(&input).await;

    let returned: Vec<_> = results.iter().map(|e| e.domain.as_str()).collect();
    assert_eq!(returned, vec!["taken.jd.local", "free.jd.local", "merchant.jd.local"]);
    assert_eq!(results[0].available(), Some(false));
    assert_eq!(results[1].available(), Some(true));
    assert_eq!(results[2].available(), Some(false));

    let requests = state.requests();
    assert_eq!(requests.len(), 3);
    for pair in requests.windows(2) {
        let gap = pair[1].received_at.duration_since(pair[0].received_at);
        assert!(
            gap >= Duration::from_millis(500),
            "requests only {:?} apart",
            gap
        );
    }
}

#[tokio::test]
async fn test_end_to_end_two_domain_batch() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let results = client
        .check_availability_batch(&domains(&["a.example.com", "b.example.com"]))
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].domain, "a.example.com");
    assert_eq!(results[0].available(), Some(true));
    assert_eq!(results[1].domain, "b.example.com");
    assert_eq!(results[1].available(), Some(false));

    let requests = state.requests();
    let gap = requests[1].received_at.duration_since(requests[0].received_at);
    assert!(gap >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_batch_failure_does_not_stop_later_checks() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let input = domains(&["boom.jd.local", "free.jd.local", "bad.jd.local"]);
    let results = client.check_availability_batch(&input).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].available(), None);
    assert_eq!(
        results[0].result.as_ref().unwrap_err().http_status(),
        Some(500)
    );
    assert_eq!(results[1].available(), Some(true));
    assert!(results[2].result.as_ref().unwrap_err().is_application());
    assert_eq!(state.requests().len(), 3);
}

#[tokio::test]
async fn test_stream_yields_entries_as_they_complete() {
    let (state, base_url) = spawn_mock().await;
    let client = client_for(&base_url);

    let input = domains(&["free.jd.local", "taken.jd.local"]);
    let mut stream = client.check_availability_stream(&input);

    let first = stream.next().await.unwrap();
    assert_eq!(first.domain, "free.jd.local");
    // Second request has not been sent yet.
    assert_eq!(state.requests().len(), 1);

    let second = stream.next().await.unwrap();
    assert_eq!(second.domain, "taken.jd.local");
    assert!(stream.next().await.is_none());
    assert_eq!(state.requests().len(), 2);
}
