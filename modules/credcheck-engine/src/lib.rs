//! Polling orchestrator for one credibility analysis session.
//!
//! Three pollers feed one view model:
//! - primary: the analysis record (title, summary, keywords, screenshot)
//! - score: the credibility score, started once primary completes
//! - similar: related articles, started once primary completes
//!
//! Every response is classified by a pure function ([`classify`]) and merged
//! by a pure reducer ([`SessionState::apply`]) that returns the next polls to
//! schedule as [`Command`]s. The [`Orchestrator`] runtime owns the state in a
//! single task, executes commands through the [`AnalysisApi`] and
//! [`Scheduler`] seams, and publishes whole snapshots over a watch channel.

pub mod api;
pub mod classify;
pub mod config;
pub mod orchestrator;
pub mod payload;
pub mod primary;
pub mod scheduler;
pub mod score;
pub mod similar;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use api::{AnalysisApi, PollOutcome, Source, TransportError, TransportErrorKind};
pub use classify::{Attempt, Classification, ErrorKind, RetryReason};
pub use config::{PollConfig, PollPolicy};
pub use credcheck_client::RawResponse;
pub use orchestrator::{Orchestrator, SessionSeed};
pub use payload::{PrimaryFields, ScorePayload, SimilarArticle};
pub use scheduler::{Scheduler, TokioScheduler};
pub use primary::PrimarySlice;
pub use score::{ScoreAvailability, ScoreSlice};
pub use similar::{SimilarAvailability, SimilarSlice};
pub use state::{Command, Phase, SessionError, SessionEvent, SessionState};
