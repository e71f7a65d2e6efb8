use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
};
use credcheck_common::codes;

use super::{forward_poll, UidQuery};
use crate::error::ProxyError;
use crate::upstream::{PollRoute, TextMapping};
use crate::AppState;

const ROUTE: PollRoute = PollRoute {
    endpoint: "/get_score",
    service: "score",
    default_error: "Failed to fetch score",
    not_found_error: "Score not found for this analysis",
    not_found_details: "The specified analysis UID was not found in the score system",
    text_mappings: &[
        TextMapping {
            needles: &["Database connection error"],
            error: "Database connection error - score temporarily unavailable",
            code: codes::DATABASE_ERROR,
        },
        TextMapping {
            needles: &["Failed to query database"],
            error: "Database query error - score temporarily unavailable",
            code: codes::DATABASE_QUERY_ERROR,
        },
    ],
};

pub async fn get_score(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Response, ProxyError> {
    let uid = query.require()?;
    forward_poll(&state, &ROUTE, &uid).await
}
