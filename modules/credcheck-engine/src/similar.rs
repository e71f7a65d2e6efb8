//! Transitions of the similar-news poller.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{PollOutcome, Source};
use crate::classify::{classify_similar, Attempt, Classification, ErrorKind, RetryReason};
use crate::config::PollPolicy;
use crate::payload::SimilarArticle;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimilarSlice {
    pub articles: Vec<SimilarArticle>,
    pub retry_count: u32,
    pub loading: bool,
    pub done: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarAvailability {
    Pending,
    Searching,
    Found,
    NoneFound,
    Failed,
}

impl SimilarSlice {
    pub fn availability(&self) -> SimilarAvailability {
        if !self.done {
            if self.loading {
                SimilarAvailability::Searching
            } else {
                SimilarAvailability::Pending
            }
        } else if !self.articles.is_empty() {
            SimilarAvailability::Found
        } else if self.error.is_some() {
            SimilarAvailability::Failed
        } else {
            SimilarAvailability::NoneFound
        }
    }

    /// Each payload replaces the list wholesale, except that an empty one
    /// never clears articles already shown.
    fn replace(&mut self, articles: Vec<SimilarArticle>) {
        if !articles.is_empty() || self.articles.is_empty() {
            self.articles = articles;
        }
        self.error = None;
    }

    fn stop(&mut self) {
        self.loading = false;
        self.done = true;
    }
}

pub(crate) fn begin(slice: &mut SimilarSlice) {
    slice.loading = true;
}

pub(crate) fn completed(
    slice: &mut SimilarSlice,
    outcome: &PollOutcome,
    policy: &PollPolicy,
) -> Option<Duration> {
    let attempt = Attempt::new(slice.retry_count, policy.max_attempts);

    match classify_similar(outcome, attempt) {
        Classification::CompletePartial(articles) => {
            slice.replace(articles);
            slice.retry_count += 1;
            if attempt.is_last() {
                slice.stop();
                slice.notice = Some(if slice.articles.is_empty() {
                    RetryReason::NoResults.terminal_message(Source::Similar)
                } else {
                    "Search completed with available results".to_string()
                });
                None
            } else {
                slice.loading = true;
                slice.notice = Some("Still searching for similar news...".to_string());
                debug!(found = slice.articles.len(), "Provisional similar news");
                Some(policy.interval)
            }
        }
        Classification::CompleteFull(articles) => {
            slice.replace(articles);
            slice.stop();
            slice.notice = None;
            info!(found = slice.articles.len(), "Similar news search finished");
            None
        }
        Classification::Retry { reason, .. } => {
            slice.retry_count += 1;
            slice.loading = true;
            slice.notice = Some(reason.progress_message(Source::Similar, attempt));
            Some(policy.interval)
        }
        Classification::Fail { kind, reason, .. } => {
            slice.retry_count += 1;
            slice.stop();
            if kind == ErrorKind::NoResults {
                slice.notice = Some(reason.terminal_message(Source::Similar));
            } else {
                slice.notice = None;
                slice.error = Some(reason.terminal_message(Source::Similar));
                warn!(kind = kind.as_str(), "Similar news polling gave up");
            }
            None
        }
    }
}
