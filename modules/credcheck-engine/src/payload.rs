//! Decoded, display-ready payloads extracted from poll responses.

use credcheck_common::{
    decode_display_text, parse_keywords, process_keywords, CredentialsResponse, ScoreResponse,
    SimilarNewsItem,
};
use serde::Serialize;

/// Fields of the primary analysis record. Each one is `None` until the
/// backend has produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrimaryFields {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub screenshot_url: Option<String>,
}

impl PrimaryFields {
    pub fn from_response(data: &CredentialsResponse) -> Self {
        let keywords = match &data.keywords {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => data.keywords.as_ref(),
            Some(serde_json::Value::Array(_)) => data.keywords.as_ref(),
            _ => None,
        }
        .map(|raw| process_keywords(&parse_keywords(raw)));

        Self {
            title: decoded(data.title.as_deref()),
            summary: decoded(data.summary.as_deref()),
            keywords,
            screenshot_url: data
                .image
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    /// Title, summary and keywords are all present.
    pub fn has_text(&self) -> bool {
        self.title.is_some() && self.summary.is_some() && self.keywords.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.has_text() && self.screenshot_url.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.keywords.is_none()
            && self.screenshot_url.is_none()
    }

    /// Copy every present field over `target`. Absent fields never erase
    /// what an earlier response delivered.
    pub fn merge_into(self, target: &mut PrimaryFields) {
        if self.title.is_some() {
            target.title = self.title;
        }
        if self.summary.is_some() {
            target.summary = self.summary;
        }
        if self.keywords.is_some() {
            target.keywords = self.keywords;
        }
        if self.screenshot_url.is_some() {
            target.screenshot_url = self.screenshot_url;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScorePayload {
    pub score: Option<f64>,
    pub explanation: Option<String>,
    pub status: Option<i64>,
}

impl From<ScoreResponse> for ScorePayload {
    fn from(data: ScoreResponse) -> Self {
        Self {
            score: data.score.filter(|s| s.is_finite()),
            explanation: decoded(data.score_short.as_deref()),
            status: data.status_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarArticle {
    pub target_url: String,
    pub title: String,
}

impl SimilarArticle {
    /// Items without a link are dropped.
    pub fn from_item(item: &SimilarNewsItem) -> Option<Self> {
        let target_url = item.target.trim();
        if target_url.is_empty() {
            return None;
        }
        Some(Self {
            target_url: target_url.to_string(),
            title: decode_display_text(&item.title).trim().to_string(),
        })
    }
}

fn decoded(raw: Option<&str>) -> Option<String> {
    raw.map(decode_display_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> CredentialsResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn fields_are_decoded_for_display() {
        let fields = PrimaryFields::from_response(&response(
            r#"{"title":"Tom &amp; Jerry&#8217;s","summary":"Line\\none","keywords":"[\"a\", \"null\", \" b \"]"}"#,
        ));
        assert_eq!(fields.title.as_deref(), Some("Tom & Jerry's"));
        assert_eq!(fields.summary.as_deref(), Some("Line\none"));
        assert_eq!(fields.keywords, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(fields.has_text());
        assert!(!fields.is_complete());
    }

    #[test]
    fn blank_fields_count_as_absent() {
        let fields = PrimaryFields::from_response(&response(
            r#"{"title":"  ","summary":"","keywords":"","image":" "}"#,
        ));
        assert!(fields.is_empty());
    }

    #[test]
    fn merge_keeps_earlier_fields() {
        let mut shown = PrimaryFields {
            title: Some("Title".into()),
            summary: Some("Summary".into()),
            ..Default::default()
        };
        PrimaryFields {
            screenshot_url: Some("https://img.example/1.png".into()),
            ..Default::default()
        }
        .merge_into(&mut shown);
        assert_eq!(shown.title.as_deref(), Some("Title"));
        assert_eq!(shown.screenshot_url.as_deref(), Some("https://img.example/1.png"));
    }

    #[test]
    fn similar_items_without_link_are_dropped() {
        let item = SimilarNewsItem {
            target: String::new(),
            title: "orphan".into(),
        };
        assert!(SimilarArticle::from_item(&item).is_none());
    }
}
