use std::time::Duration;

use crate::api::Source;

/// Retry budget and spacing for one data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Gap between a response arriving and the next request going out.
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub const fn new(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub primary: PollPolicy,
    pub score: PollPolicy,
    pub similar: PollPolicy,
    /// Delay before the first primary poll of a new analysis.
    pub initial_delay: Duration,
    /// Delay before the first primary poll when resuming a history entry.
    pub resume_delay: Duration,
    /// Delay before the first primary poll after a manual retry.
    pub retry_delay: Duration,
    /// Delay between primary completion and the first score/similar polls.
    pub downstream_delay: Duration,
    /// Bounded wait for each outbound request.
    pub request_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            primary: PollPolicy::new(3000, 100),
            score: PollPolicy::new(4000, 20),
            similar: PollPolicy::new(5000, 20),
            initial_delay: Duration::from_millis(1000),
            resume_delay: Duration::from_millis(500),
            retry_delay: Duration::from_millis(500),
            downstream_delay: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PollConfig {
    pub fn policy(&self, source: Source) -> PollPolicy {
        match source {
            Source::Primary => self.primary,
            Source::Score => self.score,
            Source::Similar => self.similar,
        }
    }
}
