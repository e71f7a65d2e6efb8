use thiserror::Error;

use crate::error::codes;

pub const MAX_URL_LENGTH: usize = 2048;

/// Why a submitted article URL was refused before it reached the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlRejection {
    #[error("URL cannot be empty")]
    Empty,

    #[error("URL too long (max {MAX_URL_LENGTH} characters)")]
    TooLong,

    #[error("Invalid URL format. Please enter a valid URL starting with http:// or https://")]
    InvalidFormat,

    #[error("URL must use HTTP or HTTPS protocol")]
    InvalidProtocol,
}

impl UrlRejection {
    pub fn code(&self) -> &'static str {
        match self {
            UrlRejection::Empty => codes::EMPTY_URL,
            UrlRejection::TooLong => codes::VALIDATION_ERROR,
            UrlRejection::InvalidFormat => codes::INVALID_URL_FORMAT,
            UrlRejection::InvalidProtocol => codes::INVALID_PROTOCOL,
        }
    }
}

/// Trim and validate a user-submitted article URL. Returns the cleaned URL.
pub fn validate_target_url(raw: &str) -> Result<String, UrlRejection> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(UrlRejection::Empty);
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(UrlRejection::TooLong);
    }
    let parsed = url::Url::parse(url).map_err(|_| UrlRejection::InvalidFormat)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlRejection::InvalidProtocol);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_https() {
        assert_eq!(
            validate_target_url("  https://example.com/a  ").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(validate_target_url("   "), Err(UrlRejection::Empty));
    }

    #[test]
    fn rejects_missing_scheme() {
        assert_eq!(validate_target_url("example.com/a"), Err(UrlRejection::InvalidFormat));
    }

    #[test]
    fn rejects_other_protocols() {
        let err = validate_target_url("ftp://example.com/file").unwrap_err();
        assert_eq!(err, UrlRejection::InvalidProtocol);
        assert_eq!(err.code(), "INVALID_PROTOCOL");
    }

    #[test]
    fn rejects_overlong() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(validate_target_url(&long), Err(UrlRejection::TooLong));
    }
}
