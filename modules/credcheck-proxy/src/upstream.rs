//! Calls to the analysis backend and the failure mappings every route shares.

use axum::http::StatusCode;
use credcheck_common::codes;
use serde_json::{Map, Value};

use crate::error::ProxyError;
use crate::AppState;

/// Status and body of a backend response, read in full.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// e.g. "HTTP 502: Bad Gateway".
    pub fn status_line(&self) -> String {
        let reason = StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");
        format!("HTTP {}: {}", self.status, reason)
    }
}

/// The backend produced no response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    Timeout,
    Connect(String),
    Network(String),
}

impl From<reqwest::Error> for UpstreamFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamFailure::Timeout
        } else if err.is_connect() {
            UpstreamFailure::Connect(err.to_string())
        } else {
            UpstreamFailure::Network(err.to_string())
        }
    }
}

impl AppState {
    pub async fn upstream_get(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<UpstreamResponse, UpstreamFailure> {
        let url = self.config.backend_url(endpoint);
        tracing::debug!(url = url.as_str(), "Forwarding to backend");
        let resp = self.http.get(&url).query(query).send().await?;
        read(resp).await
    }

    pub async fn upstream_post(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<UpstreamResponse, UpstreamFailure> {
        let url = self.config.backend_url(endpoint);
        tracing::debug!(url = url.as_str(), "Forwarding to backend");
        let resp = self.http.post(&url).json(body).send().await?;
        read(resp).await
    }
}

async fn read(resp: reqwest::Response) -> Result<UpstreamResponse, UpstreamFailure> {
    let status = resp.status().as_u16();
    let body = resp.text().await?;
    tracing::debug!(status, len = body.len(), "Backend responded");
    Ok(UpstreamResponse { status, body })
}

/// Envelope for a request that never got a response. `service` names the
/// backend component in the message, e.g. "score".
pub fn transport_error(failure: &UpstreamFailure, service: &str) -> ProxyError {
    match failure {
        UpstreamFailure::Timeout => ProxyError::new(
            StatusCode::GATEWAY_TIMEOUT,
            format!("Request timeout. The {service} service is taking too long to respond."),
            codes::TIMEOUT_ERROR,
        ),
        UpstreamFailure::Connect(_) => ProxyError::unavailable(
            format!("Unable to connect to {service} service. Please try again later."),
            codes::CONNECTION_ERROR,
        ),
        UpstreamFailure::Network(_) => ProxyError::unavailable(
            "Network error occurred. Please check your connection and try again.",
            codes::NETWORK_ERROR,
        ),
    }
}

/// Structural checks on a 2xx body: non-empty, valid JSON, an object.
pub fn parse_object(body: &str, service: &str) -> Result<Map<String, Value>, ProxyError> {
    if body.trim().is_empty() {
        return Err(ProxyError::bad_gateway(
            format!("Empty response from {service} service"),
            codes::EMPTY_RESPONSE,
        ));
    }
    let value: Value = serde_json::from_str(body).map_err(|_| {
        ProxyError::bad_gateway(
            format!("Invalid response from {service} service. Please try again."),
            codes::PARSE_ERROR,
        )
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ProxyError::bad_gateway(
            format!("Invalid response format from {service} service"),
            codes::INVALID_FORMAT,
        )),
    }
}

/// Error, details and code lifted from a failed backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamErrorFields {
    pub error: String,
    pub details: String,
    pub code: String,
}

/// A JSON error body overrides the defaults field by field. A short plain
/// text body becomes the details.
pub fn error_fields(
    resp: &UpstreamResponse,
    default_error: &str,
    max_plain_len: usize,
) -> UpstreamErrorFields {
    let mut fields = UpstreamErrorFields {
        error: default_error.to_string(),
        details: resp.status_line(),
        code: codes::http(resp.status),
    };
    match serde_json::from_str::<Value>(&resp.body) {
        Ok(Value::Object(map)) => {
            if let Some(error) = string_field(&map, "error") {
                fields.error = error;
            }
            if let Some(message) = string_field(&map, "message") {
                fields.details = message;
            }
            if let Some(code) = string_field(&map, "code") {
                fields.code = code;
            }
        }
        _ => {
            if !resp.body.is_empty() && resp.body.len() < max_plain_len {
                fields.details = resp.body.clone();
            }
        }
    }
    fields
}

/// Backend error text the polling routes recognise, mapped to a 503.
pub struct TextMapping {
    pub needles: &'static [&'static str],
    pub error: &'static str,
    pub code: &'static str,
}

/// Everything a polling route needs to normalize a failed backend response.
pub struct PollRoute {
    pub endpoint: &'static str,
    pub service: &'static str,
    pub default_error: &'static str,
    pub not_found_error: &'static str,
    pub not_found_details: &'static str,
    pub text_mappings: &'static [TextMapping],
}

impl PollRoute {
    pub fn failure(&self, resp: &UpstreamResponse, uid: &str) -> ProxyError {
        for mapping in self.text_mappings {
            if mapping.needles.iter().any(|n| resp.body.contains(n)) {
                return ProxyError::unavailable(mapping.error, mapping.code);
            }
        }

        if resp.status == 404 {
            return ProxyError::new(
                StatusCode::NOT_FOUND,
                self.not_found_error,
                codes::ANALYSIS_NOT_FOUND,
            )
            .with_details(self.not_found_details)
            .with_uid(uid);
        }
        if resp.status >= 500 {
            return ProxyError::unavailable(
                format!(
                    "{} service is temporarily unavailable. Please try again in a few minutes.",
                    capitalized(self.service)
                ),
                codes::SERVICE_UNAVAILABLE,
            );
        }

        let fields = error_fields(resp, self.default_error, 200);
        ProxyError::new(passthrough_status(resp.status), fields.error, fields.code)
            .with_details(fields.details)
    }
}

pub fn passthrough_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}

pub fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(status: u16, body: &str) -> UpstreamResponse {
        UpstreamResponse {
            status,
            body: body.to_string(),
        }
    }

    const ROUTE: PollRoute = PollRoute {
        endpoint: "/get_score",
        service: "score",
        default_error: "Failed to fetch score",
        not_found_error: "Score not found for this analysis",
        not_found_details: "The specified analysis UID was not found in the score system",
        text_mappings: &[TextMapping {
            needles: &["Database connection error"],
            error: "Database connection error - score temporarily unavailable",
            code: codes::DATABASE_ERROR,
        }],
    };

    #[test]
    fn transport_failures_map_to_gateway_codes() {
        let timeout = transport_error(&UpstreamFailure::Timeout, "score");
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.envelope.code, codes::TIMEOUT_ERROR);

        let refused = transport_error(&UpstreamFailure::Connect("refused".into()), "score");
        assert_eq!(refused.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(refused.envelope.code, codes::CONNECTION_ERROR);

        let other = transport_error(&UpstreamFailure::Network("reset".into()), "score");
        assert_eq!(other.envelope.code, codes::NETWORK_ERROR);
    }

    #[test]
    fn parse_object_rejects_each_malformed_shape() {
        assert_eq!(parse_object("  ", "x").unwrap_err().envelope.code, codes::EMPTY_RESPONSE);
        assert_eq!(parse_object("<html>", "x").unwrap_err().envelope.code, codes::PARSE_ERROR);
        assert_eq!(parse_object("[1]", "x").unwrap_err().envelope.code, codes::INVALID_FORMAT);
        assert!(parse_object(r#"{"a":1}"#, "x").is_ok());
    }

    #[test]
    fn text_mapping_wins_over_status() {
        let err = ROUTE.failure(&resp(500, "Database connection error: pool exhausted"), "abc");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.envelope.code, codes::DATABASE_ERROR);
    }

    #[test]
    fn not_found_carries_uid() {
        let err = ROUTE.failure(&resp(404, ""), "abc123");
        assert_eq!(err.envelope.code, codes::ANALYSIS_NOT_FOUND);
        assert_eq!(err.envelope.uid.as_deref(), Some("abc123"));
    }

    #[test]
    fn server_errors_become_service_unavailable() {
        let err = ROUTE.failure(&resp(502, "Bad Gateway"), "abc");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.envelope.code, codes::SERVICE_UNAVAILABLE);
        assert!(err.envelope.error.starts_with("Score service"));
    }

    #[test]
    fn other_statuses_pass_through_with_parsed_fields() {
        let err = ROUTE.failure(
            &resp(403, r#"{"error":"Forbidden","message":"token expired","code":"AUTH"}"#),
            "abc",
        );
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.envelope.error, "Forbidden");
        assert_eq!(err.envelope.details.as_deref(), Some("token expired"));
        assert_eq!(err.envelope.code, "AUTH");

        let plain = ROUTE.failure(&resp(418, "short and stout"), "abc");
        assert_eq!(plain.envelope.code, "HTTP_418");
        assert_eq!(plain.envelope.details.as_deref(), Some("short and stout"));
    }
}
