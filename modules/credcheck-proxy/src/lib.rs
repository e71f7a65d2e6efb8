//! Same-origin proxy in front of the analysis backend.
//!
//! Every route forwards to one backend endpoint and normalizes failures into
//! the [`credcheck_common::ErrorEnvelope`]. "Not ready yet" conditions are
//! answered with HTTP 200 and a `retry: true` body so pollers keep going.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderMap, HeaderValue},
    routing::{get, post},
    Router,
};
use credcheck_common::ProxyConfig;
use tower_http::set_header::SetResponseHeaderLayer;

pub mod error;
pub mod routes;
pub mod upstream;

pub use error::ProxyError;

pub struct AppState {
    pub http: reqwest::Client,
    pub config: ProxyConfig,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;
        Ok(Self { http, config })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Liveness
        .route("/", get(|| async { "ok" }))
        .route("/api/health", get(routes::health::health))
        // Submission
        .route("/api/add-target", post(routes::add_target::add_target))
        // Polling
        .route("/api/check-credentials", get(routes::credentials::check_credentials))
        .route("/api/get-score", get(routes::score::get_score))
        .route("/api/similar-news", get(routes::similar::similar_news))
        .route("/api/check-status", get(routes::status::check_status))
        // History
        .route("/api/get-history", get(routes::history::get_history))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
                .max_age(Duration::from_secs(86400)),
        )
        // Poll responses must never be served from a cache
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
