use serde::{Deserialize, Serialize};

// --- Submission ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRequest {
    pub target_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResponse {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub status: String,
}

impl TargetResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success" && !self.uid.is_empty()
    }
}

// --- Polling endpoints ---

/// Primary analysis record. Every field is optional while the backend
/// pipeline is still filling the record in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Usually a JSON array encoded as a string, e.g. `"[\"China\", \"agriculture\"]"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<serde_json::Value>,
    /// Screenshot URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl CredentialsResponse {
    /// The "record not ready yet" body the proxy answers with HTTP 200.
    pub fn not_ready(uid: &str, message: &str) -> Self {
        Self {
            status: Some(404),
            message: Some(message.to_string()),
            uid: Some(uid.to_string()),
            retry: Some(true),
            ..Default::default()
        }
    }

    pub fn has_any_data(&self) -> bool {
        fn present(s: &Option<String>) -> bool {
            s.as_deref().is_some_and(|v| !v.is_empty())
        }
        let keywords = match &self.keywords {
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Array(_)) => true,
            _ => false,
        };
        present(&self.title) || present(&self.summary) || present(&self.image) || keywords
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Some backend builds send the score as a numeric string.
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_short: Option<String>,
    /// 300 = provisional, 200 = final.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarNewsItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub target: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
}

/// `null` reads as empty and scalars as their text, so one odd item cannot
/// fail the whole list.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarNewsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<SimilarNewsItem>>,
}

/// Backend status codes shared by the score and similar-news endpoints.
pub const STATUS_FINAL: i64 = 200;
pub const STATUS_PROVISIONAL: i64 = 300;

// --- History ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub title: String,
    pub keywords: String,
    pub uid: String,
    pub create_date: String,
    pub status_code: i64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_details: Option<String>,
}

impl HistoryResponse {
    /// Empty page carrying a user-facing explanation. The history route
    /// answers every failure this way, always with HTTP 200.
    pub fn degraded(message: &str, error_type: &str, technical_details: Option<String>) -> Self {
        Self {
            history: Vec::new(),
            total_pages: 0,
            message: Some(message.to_string()),
            error_type: Some(error_type.to_string()),
            technical_details,
        }
    }
}

// --- Health ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointProbe {
    /// "reachable" or "unreachable".
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub base_url: String,
    pub add_target_endpoint: String,
    pub backend_base: EndpointProbe,
    pub backend_add_target: EndpointProbe,
    pub proxy: String,
}
