use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use credcheck_common::{codes, validate_target_url};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::ProxyError;
use crate::upstream::{
    error_fields, passthrough_status, transport_error, UpstreamFailure, UpstreamResponse,
};
use crate::AppState;

const SERVICE: &str = "analysis";

/// Submit an article URL for analysis.
pub async fn add_target(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let target_url = target_url_from(&body)?;
    let target_url = validate_target_url(&target_url)
        .map_err(|rejection| ProxyError::bad_request(rejection.to_string(), rejection.code()))?;

    info!(target_url = target_url.as_str(), "Submitting article");
    let resp = state
        .upstream_post("/add-target", &json!({ "target_url": target_url }))
        .await
        .map_err(|failure| {
            let err = transport_error(&failure, SERVICE);
            match failure {
                UpstreamFailure::Connect(_) => {
                    err.with_details("The backend service appears to be unavailable")
                }
                _ => err,
            }
        })?;

    if !resp.is_success() {
        return Err(submission_failure(&resp));
    }
    let map = submission_body(&resp.body)?;
    Ok(Json(map).into_response())
}

/// Pull `target_url` out of the raw request body.
pub fn target_url_from(body: &[u8]) -> Result<String, ProxyError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| {
        ProxyError::bad_request("Invalid JSON in request body", codes::PARSE_ERROR)
    })?;
    match value.get("target_url") {
        Some(Value::String(url)) if !url.is_empty() => Ok(url.clone()),
        _ => Err(ProxyError::bad_request(
            "Invalid request: target_url is required and must be a string",
            codes::VALIDATION_ERROR,
        )),
    }
}

/// Normalize a non-2xx submission response.
pub fn submission_failure(resp: &UpstreamResponse) -> ProxyError {
    let mut fields = error_fields(resp, "Failed to process request", 500);
    let lower = resp.body.to_lowercase();

    if resp.body.contains("Failed to insert record") {
        fields.error = "Database error - unable to save request".to_string();
        fields.code = codes::DATABASE_INSERT_ERROR.to_string();
    } else if lower.contains("duplicate") || lower.contains("already exists") {
        fields.error = "This URL has already been submitted for analysis".to_string();
        fields.code = codes::DUPLICATE_REQUEST.to_string();
    } else if lower.contains("rate limit") || lower.contains("too many") {
        fields.error = "Too many requests. Please wait before trying again.".to_string();
        fields.code = codes::RATE_LIMIT_ERROR.to_string();
    }
    warn!(status = resp.status, code = fields.code.as_str(), "Submission rejected");

    match resp.status {
        400 => ProxyError::bad_request(
            "Invalid request format. Please check your URL and try again.",
            fields.code,
        )
        .with_details(fields.details),
        429 => ProxyError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please wait a moment before trying again.",
            codes::RATE_LIMIT,
        )
        .with_details(fields.details),
        s if s >= 500 => ProxyError::unavailable(
            "Analysis service is temporarily unavailable. Please try again in a few minutes.",
            fields.code,
        )
        .with_details(fields.details),
        s => ProxyError::new(passthrough_status(s), fields.error, fields.code)
            .with_details(fields.details),
    }
}

/// Structural checks on an accepted submission: an object with a uid and a status.
pub fn submission_body(body: &str) -> Result<Map<String, Value>, ProxyError> {
    if body.trim().is_empty() {
        return Err(ProxyError::bad_gateway(
            "Empty response from analysis service",
            codes::EMPTY_RESPONSE,
        ));
    }
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ProxyError::bad_gateway(
            "Invalid response from analysis service",
            codes::RESPONSE_PARSE_ERROR,
        )
        .with_details(e.to_string())
    })?;
    let Value::Object(map) = value else {
        return Err(ProxyError::bad_gateway(
            "Invalid response format from analysis service",
            codes::INVALID_RESPONSE_FORMAT,
        ));
    };

    let missing: Vec<&str> = ["uid", "status"]
        .into_iter()
        .filter(|key| map.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(ProxyError::bad_gateway(
            "Incomplete response from analysis service",
            codes::INCOMPLETE_RESPONSE,
        )
        .with_details(format!("Missing fields: {}", missing.join(" "))));
    }
    Ok(map)
}
