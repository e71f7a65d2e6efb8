//! Session view model and its reducer.
//!
//! [`SessionState::apply`] is the only way state changes. It is synchronous
//! and performs no I/O: every side effect it wants is returned as a
//! [`Command`] for the runtime to execute.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::api::{PollOutcome, Source};
use crate::classify::ErrorKind;
use crate::config::PollConfig;
use crate::primary::{self, PrimarySlice, PrimaryStep};
use crate::score::{self, ScoreSlice};
use crate::similar::{self, SimilarSlice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Fetching,
    Processing,
    Completed,
    Error,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Start { resume: bool },
    /// A scheduled poll is about to hit the network.
    PollDispatched { source: Source, generation: u64 },
    PollCompleted {
        source: Source,
        generation: u64,
        outcome: PollOutcome,
    },
    /// The user asked to start over after an error.
    RetryRequested,
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Poll {
        source: Source,
        uid: String,
        generation: u64,
        delay: Duration,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub uid: Option<String>,
    pub url: String,
    /// Bumped by every manual retry. Responses tagged with an older
    /// generation are discarded.
    pub generation: u64,
    /// False once torn down; no further events are applied.
    pub live: bool,
    pub phase: Phase,
    pub primary: PrimarySlice,
    pub score: ScoreSlice,
    pub similar: SimilarSlice,
}

impl SessionState {
    pub fn new(uid: Option<String>, url: impl Into<String>) -> Self {
        Self {
            uid: uid.filter(|u| !u.trim().is_empty()),
            url: url.into(),
            generation: 0,
            live: true,
            phase: Phase::Initializing,
            primary: PrimarySlice::default(),
            score: ScoreSlice::default(),
            similar: SimilarSlice::default(),
        }
    }

    pub fn apply(&mut self, event: &SessionEvent, config: &PollConfig) -> Vec<Command> {
        if !self.live {
            return Vec::new();
        }

        match event {
            SessionEvent::Start { resume } => {
                let has_uid = self.uid.is_some();
                primary::start(&mut self.primary, &mut self.phase, has_uid, *resume, config)
                    .map(|delay| self.poll(Source::Primary, delay))
                    .into_iter()
                    .collect()
            }
            SessionEvent::RetryRequested => self.restart(config),
            SessionEvent::TornDown => {
                self.live = false;
                self.primary.polling = false;
                self.score.loading = false;
                self.similar.loading = false;
                Vec::new()
            }
            SessionEvent::PollDispatched { source, generation } => {
                if self.accepts(*source, *generation) {
                    if *source == Source::Primary {
                        primary::dispatched(&mut self.primary, &mut self.phase);
                    }
                } else {
                    debug!(%source, generation, current = self.generation, "Stale dispatch ignored");
                }
                Vec::new()
            }
            SessionEvent::PollCompleted {
                source,
                generation,
                outcome,
            } => {
                if !self.accepts(*source, *generation) {
                    debug!(%source, generation, current = self.generation, "Stale response ignored");
                    return Vec::new();
                }
                self.on_completed(*source, outcome, config)
            }
        }
    }

    /// Every source is finished, or the session is gone.
    pub fn is_settled(&self) -> bool {
        !self.live
            || (self.phase.is_terminal() && !self.score.loading && !self.similar.loading)
    }

    /// Whether a manual retry should be offered.
    pub fn can_retry(&self) -> bool {
        self.live
            && (self.phase == Phase::Error
                || (self.phase == Phase::Completed
                    && (self.score.error.is_some() || self.similar.error.is_some())))
    }

    fn accepts(&self, source: Source, generation: u64) -> bool {
        if generation != self.generation || self.uid.is_none() {
            return false;
        }
        match source {
            Source::Primary => !self.phase.is_terminal(),
            Source::Score => self.phase == Phase::Completed && !self.score.done,
            Source::Similar => self.phase == Phase::Completed && !self.similar.done,
        }
    }

    fn on_completed(
        &mut self,
        source: Source,
        outcome: &PollOutcome,
        config: &PollConfig,
    ) -> Vec<Command> {
        match source {
            Source::Primary => {
                match primary::completed(&mut self.primary, &mut self.phase, outcome, &config.primary)
                {
                    PrimaryStep::Continue(delay) => vec![self.poll(Source::Primary, delay)],
                    PrimaryStep::Completed => {
                        score::begin(&mut self.score);
                        similar::begin(&mut self.similar);
                        vec![
                            self.poll(Source::Score, config.downstream_delay),
                            self.poll(Source::Similar, config.downstream_delay),
                        ]
                    }
                    PrimaryStep::Stopped => Vec::new(),
                }
            }
            Source::Score => score::completed(&mut self.score, outcome, &config.score)
                .map(|delay| self.poll(Source::Score, delay))
                .into_iter()
                .collect(),
            Source::Similar => similar::completed(&mut self.similar, outcome, &config.similar)
                .map(|delay| self.poll(Source::Similar, delay))
                .into_iter()
                .collect(),
        }
    }

    /// Reset every slice, invalidate in-flight work and schedule exactly one
    /// primary poll.
    fn restart(&mut self, config: &PollConfig) -> Vec<Command> {
        let generation = self.generation + 1;
        *self = SessionState {
            generation,
            ..SessionState::new(self.uid.take(), std::mem::take(&mut self.url))
        };
        if self.uid.is_none() {
            self.phase = Phase::Error;
            self.primary.error = Some(SessionError::new(
                ErrorKind::NoUid,
                "No analysis UID provided",
            ));
            return Vec::new();
        }
        self.primary.polling = true;
        vec![self.poll(Source::Primary, config.retry_delay)]
    }

    fn poll(&self, source: Source, delay: Duration) -> Command {
        Command::Poll {
            source,
            uid: self.uid.clone().unwrap_or_default(),
            generation: self.generation,
            delay,
        }
    }
}
