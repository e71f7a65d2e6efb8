pub mod add_target;
pub mod credentials;
pub mod health;
pub mod history;
pub mod score;
pub mod similar;
pub mod status;

use std::sync::Arc;

use axum::response::{IntoResponse, Json, Response};
use credcheck_common::codes;
use serde::Deserialize;

use crate::error::ProxyError;
use crate::upstream::{parse_object, transport_error, PollRoute};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UidQuery {
    uid: Option<String>,
}

impl UidQuery {
    pub fn require(self) -> Result<String, ProxyError> {
        self.uid
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ProxyError::bad_request("UID parameter is required", codes::MISSING_UID))
    }
}

/// Forward a poll and pass a well-formed object body through unchanged.
pub(crate) async fn forward_poll(
    state: &Arc<AppState>,
    route: &PollRoute,
    uid: &str,
) -> Result<Response, ProxyError> {
    tracing::debug!(endpoint = route.endpoint, uid, "Polling backend");
    let resp = state
        .upstream_get(route.endpoint, &[("uid", uid)])
        .await
        .map_err(|e| transport_error(&e, route.service))?;

    if !resp.is_success() {
        return Err(route.failure(&resp, uid));
    }
    let body = parse_object(&resp.body, route.service)?;
    Ok(Json(body).into_response())
}
