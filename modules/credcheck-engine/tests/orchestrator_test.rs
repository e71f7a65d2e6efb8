use std::sync::Arc;
use std::time::Duration;

use credcheck_engine::testing::{connect_error, json_ok, status, InstantScheduler, ScriptedApi};
use credcheck_engine::{
    ErrorKind, Orchestrator, Phase, PollConfig, PollPolicy, ScoreAvailability, SessionSeed,
    SimilarAvailability, Source, TokioScheduler,
};
use serde_json::json;

fn seed() -> SessionSeed {
    SessionSeed {
        uid: Some("abc123".into()),
        url: "https://news.example/farm-output".into(),
    }
}

fn not_ready() -> credcheck_engine::PollOutcome {
    json_ok(json!({"status": 404, "retry": true, "message": "Record not ready"}))
}

fn full_primary() -> credcheck_engine::PollOutcome {
    json_ok(json!({
        "title": "Farm output rises",
        "summary": "Harvests are up across the region.",
        "keywords": "[\"China\", \"agriculture\"]",
        "image": "https://img.example/shot.png"
    }))
}

fn final_score(score: u32) -> credcheck_engine::PollOutcome {
    json_ok(json!({"score": score, "score_short": "Mostly reliable", "status_code": 200}))
}

fn similar_list() -> credcheck_engine::PollOutcome {
    json_ok(json!({
        "status": 200,
        "data": [
            {"target": "https://other.example/1", "title": "Regional harvest report"},
            {"target": "https://other.example/2", "title": "Grain prices &amp; exports"}
        ]
    }))
}

fn small_budget(primary_max: u32) -> PollConfig {
    PollConfig {
        primary: PollPolicy::new(3000, primary_max),
        ..PollConfig::default()
    }
}

#[tokio::test]
async fn not_ready_three_times_then_complete() {
    let api = Arc::new(
        ScriptedApi::new()
            .repeat(Source::Primary, not_ready(), 3)
            .on_primary(full_primary())
            .on_score(json_ok(json!({"score": 58, "status_code": 300})))
            .on_score(final_score(77))
            .on_similar(similar_list()),
    );
    let scheduler = Arc::new(InstantScheduler::new());
    let orch = Orchestrator::spawn(api.clone(), scheduler.clone(), PollConfig::default(), seed());

    orch.start(false);
    let state = orch.wait_until_settled().await;

    assert_eq!(state.phase, Phase::Completed);
    assert_eq!(api.requests(Source::Primary), 4);
    assert_eq!(api.requests(Source::Score), 2);
    assert_eq!(api.requests(Source::Similar), 1);
    assert_eq!(state.score.score, Some(77.0));
    assert_eq!(state.score.availability(), ScoreAvailability::Final);
    assert_eq!(state.similar.availability(), SimilarAvailability::Found);
    assert_eq!(state.similar.articles[1].title, "Grain prices & exports");
    assert_eq!(state.primary.fields.keywords.as_ref().map(Vec::len), Some(2));
    assert!(api.requested_uids().iter().all(|uid| uid == "abc123"));

    let delays = scheduler.delays();
    let config = PollConfig::default();
    assert_eq!(delays[0], config.initial_delay);
    assert_eq!(&delays[1..4], &[config.primary.interval; 3]);
    assert!(delays.contains(&config.downstream_delay));
    assert!(delays.contains(&config.score.interval));

    for source in Source::ALL {
        assert!(api.max_in_flight(source) <= 1, "{source} overlapped");
    }
    orch.shutdown().await;
}

#[tokio::test]
async fn primary_gives_up_after_budget() {
    let api = Arc::new(ScriptedApi::new().on_primary(status(503, "Service Unavailable")));
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(InstantScheduler::new()),
        small_budget(5),
        seed(),
    );

    orch.start(false);
    let state = orch.wait_until_settled().await;

    assert_eq!(state.phase, Phase::Error);
    let error = state.primary.error.clone().unwrap();
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert_eq!(api.requests(Source::Primary), 5);
    assert_eq!(api.requests(Source::Score), 0);
    assert_eq!(api.requests(Source::Similar), 0);
    assert!(state.can_retry());
}

#[tokio::test]
async fn transport_failures_exhaust_to_unexpected_error() {
    let api = Arc::new(ScriptedApi::new().on_primary(connect_error()));
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(InstantScheduler::new()),
        small_budget(3),
        seed(),
    );

    orch.start(true);
    let state = orch.wait_until_settled().await;

    let error = state.primary.error.unwrap();
    assert_eq!(error.kind, ErrorKind::UnexpectedError);
    assert_eq!(error.message, "Connection refused");
    assert_eq!(api.requests(Source::Primary), 3);
}

#[tokio::test]
async fn manual_retry_starts_a_fresh_generation() {
    let api = Arc::new(
        ScriptedApi::new()
            .repeat(Source::Primary, status(500, ""), 3)
            .on_primary(full_primary())
            .on_score(final_score(91))
            .on_similar(similar_list()),
    );
    let scheduler = Arc::new(InstantScheduler::new());
    let orch = Orchestrator::spawn(api.clone(), scheduler.clone(), small_budget(3), seed());

    orch.start(false);
    let failed = orch.wait_until_settled().await;
    assert_eq!(failed.phase, Phase::Error);

    let mut rx = orch.subscribe();
    orch.retry();
    let state = rx
        .wait_for(|s| s.generation == 1 && s.is_settled())
        .await
        .unwrap()
        .clone();

    assert_eq!(state.phase, Phase::Completed);
    assert!(state.primary.error.is_none());
    assert_eq!(state.primary.retry_count, 0);
    assert_eq!(api.requests(Source::Primary), 4);
    assert_eq!(state.score.score, Some(91.0));
    assert!(scheduler.delays().contains(&PollConfig::default().retry_delay));
}

#[tokio::test]
async fn missing_uid_never_polls() {
    let api = Arc::new(ScriptedApi::new().on_primary(full_primary()));
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(InstantScheduler::new()),
        PollConfig::default(),
        SessionSeed {
            uid: None,
            url: "https://news.example/a".into(),
        },
    );

    orch.start(false);
    let state = orch.wait_until_settled().await;

    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.primary.error.unwrap().kind, ErrorKind::NoUid);
    assert_eq!(api.requests(Source::Primary), 0);
}

#[tokio::test(start_paused = true)]
async fn polls_follow_configured_cadence() {
    let api = Arc::new(
        ScriptedApi::new()
            .repeat(Source::Primary, not_ready(), 2)
            .on_primary(full_primary())
            .on_score(final_score(64))
            .on_similar(similar_list()),
    );
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(TokioScheduler),
        PollConfig::default(),
        seed(),
    );

    let began = tokio::time::Instant::now();
    orch.start(false);
    let state = orch.wait_until_settled().await;
    let elapsed = began.elapsed();

    assert_eq!(state.phase, Phase::Completed);
    assert_eq!(api.requests(Source::Primary), 3);
    // initial delay, two primary intervals, then the downstream delay
    assert!(elapsed >= Duration::from_millis(1000 + 2 * 3000 + 1000));
    assert!(elapsed < Duration::from_millis(1000 + 2 * 3000 + 1000 + 500));
}

#[tokio::test(start_paused = true)]
async fn slow_requests_hit_the_request_timeout() {
    let api = Arc::new(
        ScriptedApi::new()
            .on_primary(full_primary())
            .with_latency(Duration::from_secs(60)),
    );
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(TokioScheduler),
        small_budget(2),
        seed(),
    );

    orch.start(false);
    let state = orch.wait_until_settled().await;

    let error = state.primary.error.unwrap();
    assert_eq!(error.kind, ErrorKind::UnexpectedError);
    assert_eq!(error.message, "Request timed out");
    assert_eq!(api.requests(Source::Primary), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_polls() {
    let api = Arc::new(ScriptedApi::new().on_primary(full_primary()));
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(TokioScheduler),
        PollConfig::default(),
        seed(),
    );

    orch.start(false);
    let state = orch.shutdown().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!state.live);
    assert!(state.is_settled());
    assert_eq!(api.requests(Source::Primary), 0);
}

#[tokio::test(start_paused = true)]
async fn retry_abandons_request_in_flight() {
    let api = Arc::new(
        ScriptedApi::new()
            .on_primary(full_primary())
            .on_score(final_score(70))
            .on_similar(similar_list())
            .with_latency(Duration::from_secs(10)),
    );
    let orch = Orchestrator::spawn(
        api.clone(),
        Arc::new(TokioScheduler),
        PollConfig::default(),
        seed(),
    );

    orch.start(false);
    // Past the initial delay, so the first primary request is outstanding.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(api.requests(Source::Primary), 1);
    assert!(!orch.snapshot().is_settled());

    let mut rx = orch.subscribe();
    orch.retry();
    let state = rx
        .wait_for(|s| s.generation == 1 && s.is_settled())
        .await
        .unwrap()
        .clone();

    assert_eq!(state.phase, Phase::Completed);
    assert_eq!(api.requests(Source::Primary), 2);
    assert_eq!(api.requests(Source::Score), 1);
}
