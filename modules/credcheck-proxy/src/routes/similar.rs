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
    endpoint: "/similar_news",
    service: "similar news",
    default_error: "Failed to fetch similar news",
    not_found_error: "Similar news not found for this analysis",
    not_found_details: "The specified analysis UID was not found in the similar news system",
    text_mappings: &[
        TextMapping {
            needles: &["Database connection error"],
            error: "Database connection error - similar news temporarily unavailable",
            code: codes::DATABASE_ERROR,
        },
        TextMapping {
            needles: &["Database query error", "Database scan error"],
            error: "Database query error - similar news temporarily unavailable",
            code: codes::DATABASE_QUERY_ERROR,
        },
    ],
};

pub async fn similar_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Response, ProxyError> {
    let uid = query.require()?;
    forward_poll(&state, &ROUTE, &uid).await
}
