//! Runtime driver for a [`SessionState`].
//!
//! One task owns the state and applies events in arrival order. Poll
//! commands run as short-lived tasks that sleep, fetch and report back as
//! events. Each generation gets its own child cancellation token, so a
//! manual retry or teardown stops outstanding polls before they hit the
//! network; the reducer's generation check discards whatever still slips
//! through.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{AnalysisApi, TransportError};
use crate::config::PollConfig;
use crate::scheduler::Scheduler;
use crate::state::{Command, SessionEvent, SessionState};

/// Identity of the analysis to follow.
#[derive(Debug, Clone, Default)]
pub struct SessionSeed {
    pub uid: Option<String>,
    pub url: String,
}

pub struct Orchestrator {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionState>,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Spawn the driver task. Nothing is polled until [`Orchestrator::start`].
    pub fn spawn(
        api: Arc<dyn AnalysisApi>,
        scheduler: Arc<dyn Scheduler>,
        config: PollConfig,
        seed: SessionSeed,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = SessionState::new(seed.uid, seed.url);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());
        let cancel_token = CancellationToken::new();

        let driver = Driver {
            api,
            scheduler,
            config,
            events: events_tx.clone(),
            cycle: cancel_token.child_token(),
            cancel_token: cancel_token.clone(),
        };
        let handle = tokio::spawn(driver.run(state, events_rx, snapshot_tx));

        Self {
            events: events_tx,
            snapshots: snapshot_rx,
            cancel_token,
            handle: Some(handle),
        }
    }

    /// Begin polling. `resume` is for reopening an analysis from history.
    pub fn start(&self, resume: bool) {
        self.send(SessionEvent::Start { resume });
    }

    /// Discard everything and poll again from scratch.
    pub fn retry(&self) {
        self.send(SessionEvent::RetryRequested);
    }

    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.clone()
    }

    /// Resolve once every poller has stopped.
    pub async fn wait_until_settled(&self) -> SessionState {
        let mut rx = self.snapshots.clone();
        let settled = rx.wait_for(SessionState::is_settled).await.map(|s| (*s).clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Tear down: no further requests go out and no further state changes
    /// are published after this returns.
    pub async fn shutdown(mut self) -> SessionState {
        self.send(SessionEvent::TornDown);
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Session driver task failed");
            }
        }
        self.snapshot()
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session driver already stopped, event dropped");
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

struct Driver {
    api: Arc<dyn AnalysisApi>,
    scheduler: Arc<dyn Scheduler>,
    config: PollConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel_token: CancellationToken,
    /// Cancelled and replaced whenever the generation changes.
    cycle: CancellationToken,
}

impl Driver {
    async fn run(
        mut self,
        mut state: SessionState,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        snapshots: watch::Sender<SessionState>,
    ) {
        loop {
            let event = tokio::select! {
                biased;
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                _ = self.cancel_token.cancelled() => break,
            };

            let generation = state.generation;
            let phase = state.phase;
            let commands = state.apply(&event, &self.config);

            if state.generation != generation {
                self.cycle.cancel();
                self.cycle = self.cancel_token.child_token();
                info!(uid = ?state.uid, generation = state.generation, "Analysis restarted");
            }
            if state.phase != phase {
                info!(uid = ?state.uid, from = ?phase, to = ?state.phase, "Analysis phase changed");
            }

            snapshots.send_replace(state.clone());

            for command in commands {
                self.execute(command);
            }
            if !state.live {
                break;
            }
        }

        self.cancel_token.cancel();
        if state.live {
            state.apply(&SessionEvent::TornDown, &self.config);
            snapshots.send_replace(state);
        }
        debug!("Session driver stopped");
    }

    fn execute(&self, command: Command) {
        let Command::Poll {
            source,
            uid,
            generation,
            delay,
        } = command;

        let api = self.api.clone();
        let scheduler = self.scheduler.clone();
        let events = self.events.clone();
        let token = self.cycle.clone();
        let timeout = self.config.request_timeout;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = scheduler.sleep(delay) => {}
            }
            if events
                .send(SessionEvent::PollDispatched { source, generation })
                .is_err()
            {
                return;
            }

            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                result = tokio::time::timeout(timeout, api.fetch(source, &uid)) => {
                    result.unwrap_or_else(|_| Err(TransportError::timeout()))
                }
            };
            debug!(%source, uid = uid.as_str(), generation, ok = outcome.is_ok(), "Poll finished");
            let _ = events.send(SessionEvent::PollCompleted {
                source,
                generation,
                outcome,
            });
        });
    }
}
