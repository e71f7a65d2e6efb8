//! Transitions of the score poller.

use std::time::Duration;

use credcheck_common::STATUS_PROVISIONAL;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{PollOutcome, Source};
use crate::classify::{classify_score, Attempt, Classification};
use crate::config::PollPolicy;
use crate::payload::ScorePayload;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreSlice {
    pub score: Option<f64>,
    pub explanation: Option<String>,
    /// Backend status of the latest payload (300 provisional, 200 final).
    pub status: Option<i64>,
    pub retry_count: u32,
    pub loading: bool,
    pub done: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// What the score panel should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAvailability {
    Pending,
    Provisional,
    Final,
    NotAvailable,
    Failed,
}

impl ScoreSlice {
    pub fn availability(&self) -> ScoreAvailability {
        if self.score.is_some() {
            if self.status == Some(STATUS_PROVISIONAL) {
                ScoreAvailability::Provisional
            } else {
                ScoreAvailability::Final
            }
        } else if self.error.is_some() {
            ScoreAvailability::Failed
        } else if self.done {
            ScoreAvailability::NotAvailable
        } else {
            ScoreAvailability::Pending
        }
    }

    fn apply(&mut self, payload: ScorePayload) {
        if payload.score.is_some() {
            self.score = payload.score;
        }
        if payload.explanation.is_some() {
            self.explanation = payload.explanation;
        }
        self.status = payload.status;
        self.error = None;
    }

    fn stop(&mut self) {
        self.loading = false;
        self.done = true;
    }
}

pub(crate) fn begin(slice: &mut ScoreSlice) {
    slice.loading = true;
}

/// Apply one score response. Returns the delay of the next poll, if any.
pub(crate) fn completed(
    slice: &mut ScoreSlice,
    outcome: &PollOutcome,
    policy: &PollPolicy,
) -> Option<Duration> {
    let attempt = Attempt::new(slice.retry_count, policy.max_attempts);

    match classify_score(outcome, attempt) {
        Classification::CompletePartial(payload) => {
            slice.apply(payload);
            slice.retry_count += 1;
            if attempt.is_last() {
                slice.stop();
                slice.notice = Some("Score analysis completed with available data".to_string());
                warn!(attempts = slice.retry_count, "Score never became final");
                None
            } else {
                slice.loading = true;
                slice.notice = Some("Credibility score still being refined...".to_string());
                debug!(score = ?slice.score, attempt = slice.retry_count, "Provisional score");
                Some(policy.interval)
            }
        }
        Classification::CompleteFull(payload) => {
            slice.apply(payload);
            slice.stop();
            slice.notice = None;
            info!(score = ?slice.score, status = ?slice.status, "Score final");
            None
        }
        Classification::Retry { reason, .. } => {
            slice.retry_count += 1;
            slice.loading = true;
            slice.notice = Some(reason.progress_message(Source::Score, attempt));
            Some(policy.interval)
        }
        Classification::Fail { kind, reason, .. } => {
            slice.retry_count += 1;
            slice.stop();
            slice.notice = None;
            slice.error = Some(reason.terminal_message(Source::Score));
            warn!(kind = kind.as_str(), "Score polling gave up");
            None
        }
    }
}
