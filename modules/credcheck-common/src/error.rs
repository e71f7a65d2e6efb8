use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredcheckError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for CredcheckError {
    fn from(err: std::io::Error) -> Self {
        CredcheckError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for CredcheckError {
    fn from(err: serde_json::Error) -> Self {
        CredcheckError::Serialization(err.to_string())
    }
}

/// Fixed JSON shape every proxy route uses for failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
            uid: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }
}

/// Error codes carried in [`ErrorEnvelope::code`].
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const EMPTY_URL: &str = "EMPTY_URL";
    pub const INVALID_PROTOCOL: &str = "INVALID_PROTOCOL";
    pub const INVALID_URL_FORMAT: &str = "INVALID_URL_FORMAT";
    pub const MISSING_UID: &str = "MISSING_UID";

    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";
    pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

    pub const RATE_LIMIT: &str = "RATE_LIMIT";
    pub const RATE_LIMIT_ERROR: &str = "RATE_LIMIT_ERROR";
    pub const DUPLICATE_REQUEST: &str = "DUPLICATE_REQUEST";
    pub const DATABASE_INSERT_ERROR: &str = "DATABASE_INSERT_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const DATABASE_QUERY_ERROR: &str = "DATABASE_QUERY_ERROR";

    pub const EMPTY_RESPONSE: &str = "EMPTY_RESPONSE";
    pub const RESPONSE_PARSE_ERROR: &str = "RESPONSE_PARSE_ERROR";
    pub const INVALID_RESPONSE_FORMAT: &str = "INVALID_RESPONSE_FORMAT";
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const INCOMPLETE_RESPONSE: &str = "INCOMPLETE_RESPONSE";

    pub const ANALYSIS_NOT_FOUND: &str = "ANALYSIS_NOT_FOUND";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

    /// Fallback code for an upstream status with no specific mapping.
    pub fn http(status: u16) -> String {
        format!("HTTP_{status}")
    }
}
