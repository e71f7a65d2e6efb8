use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use credcheck_client::{ClientError, ProxyClient, RawResponse};
use serde::Serialize;
use thiserror::Error;

/// The three independently polled data sources of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Primary,
    Score,
    Similar,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Primary, Source::Score, Source::Similar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::Score => "score",
            Source::Similar => "similar",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// A request that produced no HTTP response at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(TransportErrorKind::Timeout, "Request timed out")
    }
}

impl From<ClientError> for TransportError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Timeout => TransportError::timeout(),
            ClientError::Connect(msg) => TransportError::new(TransportErrorKind::Connect, msg),
            other => TransportError::new(TransportErrorKind::Other, other.to_string()),
        }
    }
}

/// Result of one poll: a response of any status, or a transport failure.
pub type PollOutcome = Result<RawResponse, TransportError>;

/// Fetches the current payload of one source. Implementations must not
/// interpret the response; classification happens in the reducer.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn fetch(&self, source: Source, uid: &str) -> PollOutcome;
}

#[async_trait]
impl AnalysisApi for ProxyClient {
    async fn fetch(&self, source: Source, uid: &str) -> PollOutcome {
        let result = match source {
            Source::Primary => self.check_credentials(uid).await,
            Source::Score => self.get_score(uid).await,
            Source::Similar => self.similar_news(uid).await,
        };
        result.map_err(TransportError::from)
    }
}

#[async_trait]
impl<T: AnalysisApi + ?Sized> AnalysisApi for Arc<T> {
    async fn fetch(&self, source: Source, uid: &str) -> PollOutcome {
        (**self).fetch(source, uid).await
    }
}
