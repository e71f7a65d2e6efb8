//! Submit or resume an analysis and follow it until it settles.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::Utc;
use credcheck_client::ProxyClient;
use credcheck_common::{validate_target_url, RecentCheck, RecentChecks};
use credcheck_engine::{Orchestrator, Phase, PollConfig, SessionSeed, SessionState, TokioScheduler};
use tracing::{info, warn};

use super::Context;
use crate::render;

pub async fn check(ctx: &Context, url: &str, retries: u32) -> Result<()> {
    let url = validate_target_url(url)?;
    let client = ctx.client()?;
    let target = client.submit(&url).await?;

    let store = ctx.store();
    store.append(RecentCheck {
        uid: target.uid.clone(),
        url: url.clone(),
        timestamp: Utc::now(),
        status: "analyzing".to_string(),
        session_id: store.session_id()?,
    })?;

    let seed = SessionSeed {
        uid: Some(target.uid.clone()),
        url,
    };
    let state = follow(ctx, client, seed, false, retries).await?;
    record_outcome(&store, &target.uid, &state);
    Ok(())
}

pub async fn resume(ctx: &Context, uid: &str, url: Option<String>, retries: u32) -> Result<()> {
    let store = ctx.store();
    let known = store.find(uid)?;
    let url = url
        .or_else(|| known.as_ref().map(|c| c.url.clone()))
        .unwrap_or_default();

    let seed = SessionSeed {
        uid: Some(uid.to_string()),
        url,
    };
    let state = follow(ctx, ctx.client()?, seed, true, retries).await?;
    if known.is_some() {
        record_outcome(&store, uid, &state);
    }
    Ok(())
}

/// Drive the orchestrator, printing progress, until it settles with no
/// retries left or the user interrupts.
async fn follow(
    ctx: &Context,
    client: ProxyClient,
    seed: SessionSeed,
    resume: bool,
    retries: u32,
) -> Result<SessionState> {
    let orchestrator = Orchestrator::spawn(
        Arc::new(client),
        Arc::new(TokioScheduler),
        PollConfig::default(),
        seed,
    );
    let mut snapshots = orchestrator.subscribe();
    orchestrator.start(resume);

    let mut retries_left = retries;
    let mut awaited_generation = 0;
    let mut last_line = String::new();

    loop {
        let state = snapshots.borrow_and_update().clone();
        if !ctx.json {
            let line = render::progress_line(&state);
            if line != last_line {
                eprintln!("{line}");
                last_line = line;
            }
        }

        if state.generation >= awaited_generation && state.is_settled() {
            if retries_left == 0 || !state.can_retry() {
                break;
            }
            retries_left -= 1;
            awaited_generation = state.generation + 1;
            warn!(generation = state.generation, retries_left, "Retrying analysis");
            orchestrator.retry();
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping polls");
                break;
            }
        }
    }

    let state = orchestrator.shutdown().await;
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state).context("serializing session state")?
        );
    } else {
        print!("{}", render::report(&state));
    }
    Ok(state)
}

fn record_outcome(store: &RecentChecks, uid: &str, state: &SessionState) {
    let status = match state.phase {
        Phase::Completed => "completed",
        Phase::Error => "error",
        _ => return,
    };
    if let Err(e) = store.update_status(uid, status) {
        warn!(uid, error = %e, "Could not update recent checks");
    }
}
