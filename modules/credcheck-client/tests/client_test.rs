//! ProxyClient against an in-process fake proxy.

use std::time::Duration;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use credcheck_client::{ClientError, ProxyClient};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct UidQuery {
    uid: String,
}

async fn add_target(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let url = body["target_url"].as_str().unwrap_or_default();
    if url.contains("limited") {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "Rate limit exceeded", "code": "RATE_LIMIT"})),
        )
            .into_response();
    }
    if url.contains("odd") {
        return Json(json!({"uid": "", "status": "queued"})).into_response();
    }
    Json(json!({"uid": "abc123", "status": "success"})).into_response()
}

async fn check_credentials(Query(q): Query<UidQuery>) -> impl IntoResponse {
    Json(json!({"status": 404, "retry": true, "uid": q.uid}))
}

async fn spawn_fake_proxy() -> String {
    let app = Router::new()
        .route("/api/add-target", post(add_target))
        .route("/api/check-credentials", get(check_credentials))
        .route("/api/get-score", get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> ProxyClient {
    ProxyClient::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn submit_returns_uid() {
    let base = spawn_fake_proxy().await;
    let target = client(&base).submit(" https://example.com/a ").await.unwrap();
    assert_eq!(target.uid, "abc123");
}

#[tokio::test]
async fn submit_rejects_invalid_url_without_network() {
    let err = client("http://127.0.0.1:9").submit("not a url").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
}

#[tokio::test]
async fn submit_surfaces_error_envelope() {
    let base = spawn_fake_proxy().await;
    let err = client(&base).submit("https://limited.example.com").await.unwrap_err();
    match err {
        ClientError::Api { status, envelope } => {
            assert_eq!(status, 429);
            assert_eq!(envelope.code, "RATE_LIMIT");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_without_success_status_is_unexpected() {
    let base = spawn_fake_proxy().await;
    let err = client(&base).submit("https://odd.example.com").await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn poll_returns_raw_status_and_body() {
    let base = spawn_fake_proxy().await;
    let client = client(&base);

    let primary = client.check_credentials("abc123").await.unwrap();
    assert_eq!(primary.status, 200);
    let body: serde_json::Value = serde_json::from_str(&primary.body).unwrap();
    assert_eq!(body["uid"], "abc123");

    let score = client.get_score("abc123").await.unwrap();
    assert_eq!(score.status, 503);
    assert_eq!(score.body, "down");
}

#[tokio::test]
async fn connection_refused_is_connect_error() {
    let err = client("http://127.0.0.1:9").check_credentials("abc").await.unwrap_err();
    assert!(matches!(err, ClientError::Connect(_) | ClientError::Network(_)));
}
