use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use credcheck_common::codes;

use super::UidQuery;
use crate::error::ProxyError;
use crate::upstream::{parse_object, passthrough_status, UpstreamFailure};
use crate::AppState;

pub async fn check_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Response, ProxyError> {
    let uid = query.require()?;
    if !is_path_safe(&uid) {
        return Err(
            ProxyError::bad_request("Invalid UID format", codes::INVALID_FORMAT).with_uid(uid),
        );
    }
    let endpoint = format!("/status/{uid}");

    let resp = state.upstream_get(&endpoint, &[]).await.map_err(|e| match e {
        UpstreamFailure::Timeout => ProxyError::new(
            StatusCode::GATEWAY_TIMEOUT,
            "Status check timed out",
            codes::TIMEOUT_ERROR,
        ),
        UpstreamFailure::Connect(_) | UpstreamFailure::Network(_) => ProxyError::unavailable(
            "Unable to connect to analysis service",
            codes::CONNECTION_ERROR,
        ),
    })?;

    if resp.status == 404 {
        return Err(
            ProxyError::new(StatusCode::NOT_FOUND, "Analysis not found", codes::ANALYSIS_NOT_FOUND)
                .with_uid(uid),
        );
    }
    if !resp.is_success() {
        tracing::warn!(uid = uid.as_str(), status = resp.status, "Status check failed");
        return Err(ProxyError::new(
            passthrough_status(resp.status),
            "Failed to check analysis status",
            codes::http(resp.status),
        ));
    }

    let body = parse_object(&resp.body, "analysis")?;
    Ok(Json(body).into_response())
}

/// The uid becomes one upstream path segment, so it may not carry
/// separators or dot segments.
pub fn is_path_safe(uid: &str) -> bool {
    uid != "."
        && !uid.contains("..")
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
