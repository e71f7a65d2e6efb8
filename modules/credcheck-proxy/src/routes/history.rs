//! History listing. Every failure is degraded to an empty page with an
//! explanation, always answered with HTTP 200.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use credcheck_common::{HistoryItem, HistoryResponse};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::upstream::{error_fields, UpstreamFailure, UpstreamResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    page: Option<String>,
    limit: Option<String>,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let page = query.page.filter(|p| !p.is_empty()).unwrap_or_else(|| "1".to_string());
    let limit = query.limit.filter(|l| !l.is_empty()).unwrap_or_else(|| "20".to_string());
    info!(page = page.as_str(), limit = limit.as_str(), "Fetching history");

    let resp = match state
        .upstream_get("/get_history", &[("page", page.as_str()), ("limit", limit.as_str())])
        .await
    {
        Ok(resp) => resp,
        Err(failure) => return Json(transport_failure(&failure)),
    };

    if !resp.is_success() {
        warn!(status = resp.status, "History request failed");
        return Json(upstream_failure(&resp));
    }
    Json(parse_history(&resp.body))
}

fn transport_failure(failure: &UpstreamFailure) -> HistoryResponse {
    match failure {
        UpstreamFailure::Timeout => HistoryResponse::degraded(
            "Request timeout. The history service is taking too long to respond.",
            "timeout_error",
            None,
        ),
        UpstreamFailure::Connect(_) => HistoryResponse::degraded(
            "Unable to connect to history service. Please try again later.",
            "connection_error",
            None,
        ),
        UpstreamFailure::Network(_) => HistoryResponse::degraded(
            "Network error occurred. Please check your connection and try again.",
            "network_error",
            None,
        ),
    }
}

/// Classify a non-2xx history response by its body text, then by status.
pub fn upstream_failure(resp: &UpstreamResponse) -> HistoryResponse {
    let text = resp.body.as_str();
    let lower = text.to_lowercase();

    if lower.contains("scan record") || lower.contains("failed to scan") || text.contains("scan error") {
        return HistoryResponse::degraded(
            "Database scan operation failed. This is a temporary issue that usually resolves automatically within a few minutes. The database may be under maintenance or experiencing high load.",
            "database_scan_error",
            Some(format!("Raw error: \"{}\"", text.trim())),
        );
    }

    let db_words = ["database", "query", "connection", "timeout"];
    if db_words.iter().any(|w| text.contains(w)) || lower.contains("db error") || lower.contains("sql") {
        return HistoryResponse::degraded(
            "Database is temporarily experiencing issues. This could be due to maintenance, connectivity problems, or high server load. Please try again in a few minutes.",
            "database_error",
            Some(truncate(text, 200)),
        );
    }

    if text.contains("No records found")
        || text.contains("empty")
        || text.contains("not found")
        || lower.contains("no data")
    {
        return HistoryResponse::degraded(
            "No analysis history found in database. Start analyzing articles to build your history.",
            "no_data",
            None,
        );
    }

    if resp.status == 404 {
        return HistoryResponse::degraded(
            "No history found - the history endpoint may not be available",
            "not_found",
            None,
        );
    }
    if resp.status >= 500 {
        return HistoryResponse::degraded(
            "History service is temporarily unavailable. The server may be restarting, under maintenance, or experiencing high load.",
            "server_error",
            Some(format!("{} - {}", resp.status_line(), truncate(text, 200))),
        );
    }

    let fields = error_fields(resp, "Failed to fetch history", 500);
    HistoryResponse::degraded(
        "Unable to fetch history data. Please try again later.",
        "unknown_error",
        Some(fields.details),
    )
}

/// Parse a 2xx body and normalize every item.
pub fn parse_history(body: &str) -> HistoryResponse {
    if body.trim().is_empty() {
        return HistoryResponse::degraded(
            "No data available - empty response from service",
            "empty_response",
            None,
        );
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => normalize_history(&value),
        Ok(other) => HistoryResponse::degraded(
            "Invalid response format from history service",
            "invalid_format",
            Some(format!("Received: {}", json_type(&other))),
        ),
        Err(e) => HistoryResponse::degraded(
            "Invalid response from history service - unable to parse data",
            "parse_error",
            Some(e.to_string()),
        ),
    }
}

/// Fill in every field a history consumer relies on.
pub fn normalize_history(value: &Value) -> HistoryResponse {
    let items = value
        .get("history")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let history: Vec<HistoryItem> = items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_item(item, index))
        .collect();

    let total_pages = match value.get("total_pages") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        _ => i64::from(!history.is_empty()),
    };

    HistoryResponse {
        history,
        total_pages,
        ..Default::default()
    }
}

fn normalize_item(item: &Value, index: usize) -> HistoryItem {
    let text = |key: &str| -> Option<String> {
        item.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let keywords = match item.get("keywords") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Array(items)) => Value::Array(items.clone()).to_string(),
        _ => "[]".to_string(),
    };

    HistoryItem {
        title: text("title")
            .or_else(|| text("url"))
            .unwrap_or_else(|| "Unknown Article".to_string()),
        keywords,
        uid: text("uid").unwrap_or_else(|| {
            format!("unknown_{}_{}", Utc::now().timestamp_millis(), index)
        }),
        create_date: text("create_date").unwrap_or_else(|| Utc::now().to_rfc3339()),
        status_code: item.get("status_code").and_then(Value::as_i64).unwrap_or(500),
        summary: text("summary").unwrap_or_default(),
        url: text("url").or_else(|| text("title")).unwrap_or_default(),
        image: text("image").unwrap_or_default(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
