use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use credcheck_common::ErrorEnvelope;
use thiserror::Error;

/// A failed proxy request, rendered as the error envelope.
#[derive(Debug, Error)]
#[error("{status} {}: {}", envelope.code, envelope.error)]
pub struct ProxyError {
    pub status: StatusCode,
    pub envelope: ErrorEnvelope,
}

impl ProxyError {
    pub fn new(status: StatusCode, error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            envelope: ErrorEnvelope::new(error, code),
        }
    }

    pub fn bad_request(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, code)
    }

    pub fn bad_gateway(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, error, code)
    }

    pub fn unavailable(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error, code)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.envelope.details = Some(details.into());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.envelope.uid = Some(uid.into());
        self
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = self.status.as_u16(), code = self.envelope.code.as_str(), "Proxy request failed");
        } else {
            tracing::debug!(status = self.status.as_u16(), code = self.envelope.code.as_str(), "Proxy request rejected");
        }
        (self.status, Json(self.envelope)).into_response()
    }
}
