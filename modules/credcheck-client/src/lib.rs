pub mod error;

pub use error::{ClientError, Result};

use std::time::Duration;

use credcheck_common::{
    codes, validate_target_url, ErrorEnvelope, HealthReport, HistoryResponse, TargetRequest,
    TargetResponse,
};
use serde::de::DeserializeOwned;

/// Status and body of one poll response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Client for the same-origin proxy routes.
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit an article URL for analysis. The URL is validated locally, so
    /// malformed input never reaches the proxy.
    pub async fn submit(&self, target_url: &str) -> Result<TargetResponse> {
        let target_url = validate_target_url(target_url)?;
        let endpoint = format!("{}/api/add-target", self.base_url);

        tracing::info!(target_url = target_url.as_str(), "Submitting article for analysis");
        let resp = self
            .client
            .post(&endpoint)
            .json(&TargetRequest { target_url })
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Api {
                status,
                envelope: envelope_from_body(status, &body),
            });
        }

        let target: TargetResponse = serde_json::from_str(&body)?;
        if !target.is_success() {
            return Err(ClientError::UnexpectedResponse(format!(
                "status {:?}, uid {:?}",
                target.status, target.uid
            )));
        }
        tracing::info!(uid = target.uid.as_str(), "Analysis started");
        Ok(target)
    }

    /// Poll the primary analysis record.
    pub async fn check_credentials(&self, uid: &str) -> Result<RawResponse> {
        self.get_raw("/api/check-credentials", uid).await
    }

    /// Poll the credibility score.
    pub async fn get_score(&self, uid: &str) -> Result<RawResponse> {
        self.get_raw("/api/get-score", uid).await
    }

    /// Poll the related-articles search.
    pub async fn similar_news(&self, uid: &str) -> Result<RawResponse> {
        self.get_raw("/api/similar-news", uid).await
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.get_json("/api/health", &[]).await
    }

    pub async fn history(&self, page: u32, limit: u32) -> Result<HistoryResponse> {
        let page = page.to_string();
        let limit = limit.to_string();
        self.get_json("/api/get-history", &[("page", page.as_str()), ("limit", limit.as_str())])
            .await
    }

    async fn get_raw(&self, path: &str, uid: &str) -> Result<RawResponse> {
        let endpoint = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&endpoint)
            .query(&[("uid", uid)])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        tracing::debug!(path, uid, status, len = body.len(), "Poll response");
        Ok(RawResponse { status, body })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let endpoint = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&endpoint).query(query).send().await?;

        let status = resp.status().as_u16();
        let body = resp.text().await?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Api {
                status,
                envelope: envelope_from_body(status, &body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

fn envelope_from_body(status: u16, body: &str) -> ErrorEnvelope {
    serde_json::from_str(body).unwrap_or_else(|_| {
        let env = ErrorEnvelope::new(format!("Request failed with status {status}"), codes::http(status));
        if body.is_empty() {
            env
        } else {
            env.with_details(body.chars().take(200).collect::<String>())
        }
    })
}
