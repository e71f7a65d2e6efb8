use std::sync::Arc;

use axum::{extract::State, response::Json};
use credcheck_common::{EndpointProbe, HealthReport};

use crate::AppState;

/// Probe the backend root and its submission endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let base_url = state.config.backend_base_url.clone();
    let add_target_endpoint = state.config.backend_url("/add-target");

    let (backend_base, backend_add_target) = tokio::join!(
        probe(&state, &base_url),
        probe(&state, &add_target_endpoint),
    );

    Json(HealthReport {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        base_url,
        add_target_endpoint,
        backend_base,
        backend_add_target,
        proxy: "working".to_string(),
    })
}

async fn probe(state: &AppState, url: &str) -> EndpointProbe {
    match state
        .http
        .get(url)
        .timeout(state.config.health_timeout)
        .send()
        .await
    {
        Ok(resp) => probe_result(resp.status().as_u16()),
        Err(e) => {
            tracing::debug!(url, error = %e, "Health probe failed");
            EndpointProbe {
                status: "unreachable".to_string(),
                status_code: None,
                note: None,
            }
        }
    }
}

pub fn probe_result(status: u16) -> EndpointProbe {
    EndpointProbe {
        status: "reachable".to_string(),
        status_code: Some(status),
        note: (status == 405).then(|| "Endpoint exists but only accepts POST".to_string()),
    }
}
