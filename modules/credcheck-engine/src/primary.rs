//! Transitions of the primary poller.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{PollOutcome, Source};
use crate::classify::{classify_primary, Attempt, Classification, ErrorKind};
use crate::config::{PollConfig, PollPolicy};
use crate::payload::PrimaryFields;
use crate::state::{Phase, SessionError};

const SCREENSHOT_PENDING: &str = "Text analysis ready, waiting for screenshot...";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrimarySlice {
    pub fields: PrimaryFields,
    pub retry_count: u32,
    /// A primary poll is scheduled or in flight.
    pub polling: bool,
    pub notice: Option<String>,
    pub error: Option<SessionError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrimaryStep {
    /// Schedule the next poll after this delay.
    Continue(std::time::Duration),
    /// Primary is done; downstream pollers should start.
    Completed,
    /// Terminal error, nothing further to schedule.
    Stopped,
}

/// Handle a start request. Returns the delay of the first poll, or `None`
/// when nothing should be scheduled.
pub(crate) fn start(
    slice: &mut PrimarySlice,
    phase: &mut Phase,
    has_uid: bool,
    resume: bool,
    config: &PollConfig,
) -> Option<std::time::Duration> {
    if *phase != Phase::Initializing || slice.polling {
        debug!(phase = ?phase, "Start ignored, session already running");
        return None;
    }
    if !has_uid {
        *phase = Phase::Error;
        slice.error = Some(SessionError::new(
            ErrorKind::NoUid,
            "No analysis UID provided",
        ));
        return None;
    }

    slice.polling = true;
    if resume {
        *phase = Phase::Fetching;
        Some(config.resume_delay)
    } else {
        Some(config.initial_delay)
    }
}

pub(crate) fn dispatched(slice: &mut PrimarySlice, phase: &mut Phase) {
    slice.polling = true;
    *phase = Phase::Processing;
}

pub(crate) fn completed(
    slice: &mut PrimarySlice,
    phase: &mut Phase,
    outcome: &PollOutcome,
    policy: &PollPolicy,
) -> PrimaryStep {
    let attempt = Attempt::new(slice.retry_count, policy.max_attempts);

    match classify_primary(outcome, attempt) {
        Classification::CompleteFull(fields) => {
            fields.merge_into(&mut slice.fields);
            finish(slice, phase);
            info!(attempts = attempt.used + 1, "Analysis complete");
            PrimaryStep::Completed
        }
        Classification::CompletePartial(fields) => {
            fields.merge_into(&mut slice.fields);
            slice.retry_count += 1;
            if attempt.is_last() {
                warn!(
                    attempts = slice.retry_count,
                    "Screenshot never arrived, completing with text only"
                );
                finish(slice, phase);
                PrimaryStep::Completed
            } else {
                slice.notice = Some(SCREENSHOT_PENDING.to_string());
                PrimaryStep::Continue(policy.interval)
            }
        }
        Classification::Retry { reason, partial } => {
            if let Some(fields) = partial {
                fields.merge_into(&mut slice.fields);
            }
            slice.retry_count += 1;
            slice.notice = Some(reason.progress_message(Source::Primary, attempt));
            debug!(attempt = slice.retry_count, reason = ?reason, "Primary not ready");
            PrimaryStep::Continue(policy.interval)
        }
        Classification::Fail {
            kind,
            reason,
            partial,
        } => {
            if let Some(fields) = partial {
                fields.merge_into(&mut slice.fields);
            }
            slice.retry_count += 1;
            slice.polling = false;
            slice.notice = None;
            slice.error = Some(SessionError::new(
                kind,
                reason.terminal_message(Source::Primary),
            ));
            *phase = Phase::Error;
            warn!(kind = kind.as_str(), attempts = slice.retry_count, "Analysis failed");
            PrimaryStep::Stopped
        }
    }
}

fn finish(slice: &mut PrimarySlice, phase: &mut Phase) {
    slice.polling = false;
    slice.notice = None;
    slice.error = None;
    *phase = Phase::Completed;
}
