//! Pure classification of poll responses.
//!
//! A classifier sees one outcome and the attempt budget and decides whether
//! the poller should retry, stop with what it has, or give up. It never
//! touches state; the per-source transition modules apply the result.

use credcheck_common::{
    CredentialsResponse, ScoreResponse, SimilarNewsResponse, STATUS_FINAL, STATUS_PROVISIONAL,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{PollOutcome, Source};
use crate::payload::{PrimaryFields, ScorePayload, SimilarArticle};

/// Position of the current response inside a source's retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// Unsuccessful responses already counted for this source.
    pub used: u32,
    pub max: u32,
}

impl Attempt {
    pub fn new(used: u32, max: u32) -> Self {
        Self { used, max }
    }

    /// After this response the budget is spent.
    pub fn is_last(&self) -> bool {
        self.used.saturating_add(1) >= self.max
    }
}

/// Terminal failure kinds surfaced in the session error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Timeout,
    ParseError,
    EmptyResponse,
    UnexpectedError,
    NoUid,
    NoResults,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ParseError => "PARSE_ERROR",
            ErrorKind::EmptyResponse => "EMPTY_RESPONSE",
            ErrorKind::UnexpectedError => "UNEXPECTED_ERROR",
            ErrorKind::NoUid => "NO_UID",
            ErrorKind::NoResults => "NO_RESULTS",
        }
    }
}

/// Why a response was not good enough to stop polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    HttpStatus(u16),
    EmptyBody,
    MalformedJson,
    /// The backend says the record exists but is not ready yet.
    NotReady,
    NoData,
    /// Some primary fields arrived, not enough to render.
    PartialFields,
    NoResults,
    Network(String),
}

impl RetryReason {
    /// The error kind reported when this reason exhausts the budget.
    pub fn exhausted_kind(&self) -> ErrorKind {
        match self {
            RetryReason::HttpStatus(_)
            | RetryReason::NotReady
            | RetryReason::NoData
            | RetryReason::PartialFields => ErrorKind::Timeout,
            RetryReason::EmptyBody => ErrorKind::EmptyResponse,
            RetryReason::MalformedJson => ErrorKind::ParseError,
            RetryReason::NoResults => ErrorKind::NoResults,
            RetryReason::Network(_) => ErrorKind::UnexpectedError,
        }
    }

    /// Transient notice shown while the poller keeps going.
    pub fn progress_message(&self, source: Source, attempt: Attempt) -> String {
        let subject = match source {
            Source::Primary => "analysis",
            Source::Score => "score",
            Source::Similar => "similar news",
        };
        match self {
            RetryReason::HttpStatus(status) => match source {
                Source::Primary => format!("Waiting for analysis to complete... ({status})"),
                Source::Score => format!("Loading credibility score... ({status})"),
                Source::Similar => format!("Loading similar news... ({status})"),
            },
            RetryReason::EmptyBody | RetryReason::NoData => {
                format!("Waiting for {subject} data...")
            }
            RetryReason::MalformedJson => format!("Processing {subject} data..."),
            RetryReason::NotReady => "Analysis still processing...".to_string(),
            RetryReason::PartialFields => {
                "Partial results received, waiting for the rest...".to_string()
            }
            RetryReason::NoResults => "Searching for similar news...".to_string(),
            RetryReason::Network(_) => format!(
                "Connection issue, retrying... ({}/{})",
                attempt.used.saturating_add(1),
                attempt.max
            ),
        }
    }

    /// Message shown when this reason ends a source's polling.
    pub fn terminal_message(&self, source: Source) -> String {
        match (source, self) {
            (_, RetryReason::Network(message)) => message.clone(),
            (Source::Primary, RetryReason::HttpStatus(_) | RetryReason::NotReady) => {
                "Analysis is taking too long to complete. Please try again later.".to_string()
            }
            (Source::Primary, RetryReason::NoData | RetryReason::PartialFields) => {
                "Analysis is taking too long to complete. The service may be overloaded."
                    .to_string()
            }
            (Source::Primary, RetryReason::EmptyBody) => {
                "Empty response from analysis service".to_string()
            }
            (Source::Primary, RetryReason::MalformedJson) => {
                "Invalid response format from analysis service".to_string()
            }
            (Source::Score, RetryReason::EmptyBody) => "Empty response from score service".to_string(),
            (Source::Score, RetryReason::MalformedJson) => {
                "Invalid response format from score service".to_string()
            }
            (Source::Score, _) => "Unable to load credibility score at this time".to_string(),
            (Source::Similar, RetryReason::EmptyBody) => {
                "Empty response from similar news service".to_string()
            }
            (Source::Similar, RetryReason::MalformedJson) => {
                "Invalid response format from similar news service".to_string()
            }
            (Source::Similar, RetryReason::NoResults) => {
                "No similar news found for this article".to_string()
            }
            (Source::Similar, _) | (Source::Primary, RetryReason::NoResults) => {
                "Unable to load similar news at this time".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification<P> {
    /// Poll again; `partial` carries any fields worth showing meanwhile.
    Retry { reason: RetryReason, partial: Option<P> },
    /// Usable but not final. The poller may continue if budget remains.
    CompletePartial(P),
    CompleteFull(P),
    /// The budget is spent.
    Fail {
        kind: ErrorKind,
        reason: RetryReason,
        partial: Option<P>,
    },
}

fn retry_or_fail<P>(reason: RetryReason, partial: Option<P>, attempt: Attempt) -> Classification<P> {
    if attempt.is_last() {
        Classification::Fail {
            kind: reason.exhausted_kind(),
            reason,
            partial,
        }
    } else {
        Classification::Retry { reason, partial }
    }
}

/// Structural checks shared by every source, in order: transport, HTTP
/// status, empty body, then JSON shape.
fn parse_body<T: DeserializeOwned>(outcome: &PollOutcome) -> Result<T, RetryReason> {
    let resp = outcome
        .as_ref()
        .map_err(|e| RetryReason::Network(e.message.clone()))?;
    if !resp.is_success() {
        return Err(RetryReason::HttpStatus(resp.status));
    }
    if resp.body.trim().is_empty() {
        return Err(RetryReason::EmptyBody);
    }
    let value: serde_json::Value =
        serde_json::from_str(&resp.body).map_err(|_| RetryReason::MalformedJson)?;
    if !value.is_object() {
        return Err(RetryReason::MalformedJson);
    }
    serde_json::from_value(value).map_err(|_| RetryReason::MalformedJson)
}

pub fn classify_primary(outcome: &PollOutcome, attempt: Attempt) -> Classification<PrimaryFields> {
    let data: CredentialsResponse = match parse_body(outcome) {
        Ok(data) => data,
        Err(reason) => return retry_or_fail(reason, None, attempt),
    };

    let fields = PrimaryFields::from_response(&data);
    if fields.is_complete() {
        return Classification::CompleteFull(fields);
    }
    if fields.has_text() {
        return Classification::CompletePartial(fields);
    }

    let partial = (!fields.is_empty()).then_some(fields);
    let not_ready = matches!(data.status, Some(404) | Some(205)) || data.retry == Some(true);
    let reason = if not_ready {
        RetryReason::NotReady
    } else if partial.is_none() {
        RetryReason::NoData
    } else {
        RetryReason::PartialFields
    };
    retry_or_fail(reason, partial, attempt)
}

pub fn classify_score(outcome: &PollOutcome, attempt: Attempt) -> Classification<ScorePayload> {
    let data: ScoreResponse = match parse_body(outcome) {
        Ok(data) => data,
        Err(reason) => return retry_or_fail(reason, None, attempt),
    };

    let payload = ScorePayload::from(data);
    match payload.status {
        Some(STATUS_PROVISIONAL) => Classification::CompletePartial(payload),
        // 200 is final; any other status is accepted as final as well.
        _ => Classification::CompleteFull(payload),
    }
}

pub fn classify_similar(
    outcome: &PollOutcome,
    attempt: Attempt,
) -> Classification<Vec<SimilarArticle>> {
    let data: SimilarNewsResponse = match parse_body(outcome) {
        Ok(data) => data,
        Err(reason) => return retry_or_fail(reason, None, attempt),
    };

    let articles: Vec<SimilarArticle> = data
        .data
        .unwrap_or_default()
        .iter()
        .filter_map(SimilarArticle::from_item)
        .collect();

    match data.status {
        Some(STATUS_PROVISIONAL) => Classification::CompletePartial(articles),
        Some(STATUS_FINAL) => Classification::CompleteFull(articles),
        _ if !articles.is_empty() => Classification::CompleteFull(articles),
        _ => retry_or_fail(RetryReason::NoResults, None, attempt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TransportError, TransportErrorKind};
    use credcheck_client::RawResponse;
    use serde_json::json;

    fn ok(body: serde_json::Value) -> PollOutcome {
        Ok(RawResponse::new(200, body.to_string()))
    }

    const FIRST: Attempt = Attempt { used: 0, max: 100 };
    const LAST: Attempt = Attempt { used: 99, max: 100 };

    #[test]
    fn attempt_budget_boundary() {
        assert!(!Attempt::new(98, 100).is_last());
        assert!(Attempt::new(99, 100).is_last());
        assert!(Attempt::new(0, 1).is_last());
        assert!(Attempt::new(0, 0).is_last());
    }

    #[test]
    fn all_four_fields_complete_primary() {
        let outcome = ok(json!({
            "title": "T", "summary": "S", "keywords": "[\"k\"]", "image": "https://img/1.png"
        }));
        assert!(matches!(
            classify_primary(&outcome, FIRST),
            Classification::CompleteFull(f) if f.screenshot_url.as_deref() == Some("https://img/1.png")
        ));
    }

    #[test]
    fn text_without_screenshot_is_partial_completion() {
        let outcome = ok(json!({"title": "T", "summary": "S", "keywords": "[\"k\"]"}));
        assert!(matches!(
            classify_primary(&outcome, LAST),
            Classification::CompletePartial(_)
        ));
    }

    #[test]
    fn not_ready_body_is_retried() {
        let outcome = ok(json!({"status": 404, "retry": true, "message": "Record not ready"}));
        assert_eq!(
            classify_primary(&outcome, FIRST),
            Classification::Retry {
                reason: RetryReason::NotReady,
                partial: None
            }
        );
        let outcome = ok(json!({"status": 205}));
        assert!(matches!(
            classify_primary(&outcome, FIRST),
            Classification::Retry { reason: RetryReason::NotReady, .. }
        ));
    }

    #[test]
    fn partial_fields_are_carried_on_retry() {
        let outcome = ok(json!({"title": "Only title"}));
        match classify_primary(&outcome, FIRST) {
            Classification::Retry { reason, partial } => {
                assert_eq!(reason, RetryReason::PartialFields);
                assert_eq!(partial.unwrap().title.as_deref(), Some("Only title"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn structural_failures_in_order() {
        let cases: Vec<(PollOutcome, RetryReason)> = vec![
            (Ok(RawResponse::new(503, "")), RetryReason::HttpStatus(503)),
            (Ok(RawResponse::new(200, "  ")), RetryReason::EmptyBody),
            (Ok(RawResponse::new(200, "<html>")), RetryReason::MalformedJson),
            (Ok(RawResponse::new(200, "[1,2]")), RetryReason::MalformedJson),
            (ok(json!({})), RetryReason::NoData),
        ];
        for (outcome, expected) in cases {
            assert_eq!(
                classify_primary(&outcome, FIRST),
                Classification::Retry {
                    reason: expected,
                    partial: None
                }
            );
        }
    }

    #[test]
    fn exhaustion_maps_reason_to_kind() {
        let cases = vec![
            (Ok(RawResponse::new(500, "")), ErrorKind::Timeout),
            (Ok(RawResponse::new(200, "")), ErrorKind::EmptyResponse),
            (Ok(RawResponse::new(200, "{oops")), ErrorKind::ParseError),
            (
                Err(TransportError::new(TransportErrorKind::Connect, "refused")),
                ErrorKind::UnexpectedError,
            ),
        ];
        for (outcome, expected) in cases {
            match classify_primary(&outcome, LAST) {
                Classification::Fail { kind, .. } => assert_eq!(kind, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn score_status_decides_finality() {
        let attempt = Attempt::new(0, 20);
        assert!(matches!(
            classify_score(&ok(json!({"score": 42, "status_code": 300})), attempt),
            Classification::CompletePartial(p) if p.score == Some(42.0)
        ));
        assert!(matches!(
            classify_score(&ok(json!({"score": 88, "score_short": "Good", "status_code": 200})), attempt),
            Classification::CompleteFull(p) if p.explanation.as_deref() == Some("Good")
        ));
        assert!(matches!(
            classify_score(&ok(json!({"status_code": 500})), attempt),
            Classification::CompleteFull(p) if p.score.is_none()
        ));
    }

    #[test]
    fn similar_unknown_status_depends_on_list() {
        let attempt = Attempt::new(0, 20);
        let with_items = ok(json!({"status": 0, "data": [{"target": "https://a", "title": "A"}]}));
        assert!(matches!(
            classify_similar(&with_items, attempt),
            Classification::CompleteFull(list) if list.len() == 1
        ));
        let empty = ok(json!({"status": 0, "data": []}));
        assert!(matches!(
            classify_similar(&empty, attempt),
            Classification::Retry { reason: RetryReason::NoResults, .. }
        ));
        match classify_similar(&empty, Attempt::new(19, 20)) {
            Classification::Fail { kind, .. } => assert_eq!(kind, ErrorKind::NoResults),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn similar_provisional_and_final() {
        let attempt = Attempt::new(0, 20);
        assert!(matches!(
            classify_similar(&ok(json!({"status": 300, "data": []})), attempt),
            Classification::CompletePartial(list) if list.is_empty()
        ));
        assert!(matches!(
            classify_similar(&ok(json!({"status": 200})), attempt),
            Classification::CompleteFull(list) if list.is_empty()
        ));
    }

    #[test]
    fn similar_null_title_keeps_the_list() {
        let outcome = ok(json!({"status": 200, "data": [
            {"target": "https://a.example/1", "title": null},
            {"target": "https://b.example/2", "title": "B"}
        ]}));
        match classify_similar(&outcome, LAST) {
            Classification::CompleteFull(list) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].target_url, "https://a.example/1");
                assert_eq!(list[1].title, "B");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_kind_serializes_screaming() {
        assert_eq!(serde_json::to_value(ErrorKind::NoUid).unwrap(), json!("NO_UID"));
        assert_eq!(ErrorKind::UnexpectedError.as_str(), "UNEXPECTED_ERROR");
    }
}
