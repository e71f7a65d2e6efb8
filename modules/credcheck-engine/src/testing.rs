// Test doubles for the two runtime seams.
//
// - ScriptedApi (AnalysisApi): per-source queue of canned outcomes
// - InstantScheduler (Scheduler): records delays, never waits

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use credcheck_client::RawResponse;

use crate::api::{AnalysisApi, PollOutcome, Source, TransportError, TransportErrorKind};
use crate::scheduler::Scheduler;

/// 200 response with a JSON body.
pub fn json_ok(body: serde_json::Value) -> PollOutcome {
    Ok(RawResponse::new(200, body.to_string()))
}

pub fn status(code: u16, body: &str) -> PollOutcome {
    Ok(RawResponse::new(code, body))
}

pub fn connect_error() -> PollOutcome {
    Err(TransportError::new(
        TransportErrorKind::Connect,
        "Connection refused",
    ))
}

/// Queue-based API. Each source answers with its scripted outcomes in order
/// and repeats the last one once the queue runs dry. A source with no script
/// fails with a transport error.
/// Builder pattern: `.on_primary()`, `.on_score()`, `.on_similar()`.
#[derive(Default)]
pub struct ScriptedApi {
    scripts: Mutex<HashMap<Source, VecDeque<PollOutcome>>>,
    last: Mutex<HashMap<Source, PollOutcome>>,
    requests: Mutex<Vec<(Source, String)>>,
    in_flight: Mutex<HashMap<Source, usize>>,
    max_in_flight: Mutex<HashMap<Source, usize>>,
    latency: Option<Duration>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, source: Source, outcome: PollOutcome) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(source)
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn on_primary(self, outcome: PollOutcome) -> Self {
        self.on(Source::Primary, outcome)
    }

    pub fn on_score(self, outcome: PollOutcome) -> Self {
        self.on(Source::Score, outcome)
    }

    pub fn on_similar(self, outcome: PollOutcome) -> Self {
        self.on(Source::Similar, outcome)
    }

    /// Queue the same outcome `times` times.
    pub fn repeat(mut self, source: Source, outcome: PollOutcome, times: usize) -> Self {
        for _ in 0..times {
            self = self.on(source, outcome.clone());
        }
        self
    }

    /// Hold every response for this long (tokio time, so it respects a
    /// paused clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn requests(&self, source: Source) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == source)
            .count()
    }

    pub fn requested_uids(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, uid)| uid.clone())
            .collect()
    }

    /// Highest number of simultaneous requests seen for a source.
    pub fn max_in_flight(&self, source: Source) -> usize {
        self.max_in_flight
            .lock()
            .unwrap()
            .get(&source)
            .copied()
            .unwrap_or(0)
    }

    fn next(&self, source: Source) -> PollOutcome {
        let queued = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&source)
            .and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        match queued {
            Some(outcome) => {
                last.insert(source, outcome.clone());
                outcome
            }
            None => last.get(&source).cloned().unwrap_or_else(|| {
                Err(TransportError::new(
                    TransportErrorKind::Other,
                    format!("no scripted response for {source}"),
                ))
            }),
        }
    }
}

#[async_trait]
impl AnalysisApi for ScriptedApi {
    async fn fetch(&self, source: Source, uid: &str) -> PollOutcome {
        self.requests
            .lock()
            .unwrap()
            .push((source, uid.to_string()));
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let current = in_flight.entry(source).or_default();
            *current += 1;
            let mut max = self.max_in_flight.lock().unwrap();
            let seen = max.entry(source).or_default();
            *seen = (*seen).max(*current);
        }

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }

        if let Some(current) = self.in_flight.lock().unwrap().get_mut(&source) {
            *current -= 1;
        }
        self.next(source)
    }
}

/// Scheduler that returns immediately and keeps every requested delay.
#[derive(Default)]
pub struct InstantScheduler {
    delays: Mutex<Vec<Duration>>,
}

impl InstantScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for InstantScheduler {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
        tokio::task::yield_now().await;
    }
}
