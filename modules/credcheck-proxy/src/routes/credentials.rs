use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
};
use credcheck_common::CredentialsResponse;
use serde_json::{Map, Value};
use tracing::info;

use super::UidQuery;
use crate::error::ProxyError;
use crate::upstream::{parse_object, transport_error, PollRoute};
use crate::AppState;

const ROUTE: PollRoute = PollRoute {
    endpoint: "/check_credentials",
    service: "credentials",
    default_error: "Failed to check credentials",
    not_found_error: "Analysis not found",
    not_found_details: "The specified analysis UID was not found in the system",
    text_mappings: &[],
};

/// Backend text for a record that has not been created yet.
const RECORD_MISSING: &str = "Failed to retrieve record";

const DATA_FIELDS: [&str; 4] = ["title", "summary", "keywords", "image"];

pub async fn check_credentials(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Response, ProxyError> {
    let uid = query.require()?;
    let resp = state
        .upstream_get(ROUTE.endpoint, &[("uid", uid.as_str())])
        .await
        .map_err(|e| transport_error(&e, ROUTE.service))?;

    if !resp.is_success() {
        if resp.body.contains(RECORD_MISSING) {
            info!(uid = uid.as_str(), "Record not created yet, asking client to retry");
            return Ok(not_ready(&uid, "Analysis record not found - still initializing"));
        }
        return Err(ROUTE.failure(&resp, &uid));
    }

    let body = parse_object(&resp.body, ROUTE.service)?;
    if !has_meaningful_data(&body) {
        info!(uid = uid.as_str(), "Record has no data yet, asking client to retry");
        return Ok(not_ready(&uid, "Analysis data not ready - still processing"));
    }
    Ok(Json(body).into_response())
}

fn not_ready(uid: &str, message: &str) -> Response {
    Json(CredentialsResponse::not_ready(uid, message)).into_response()
}

/// At least one of the record's data fields is non-empty.
pub fn has_meaningful_data(body: &Map<String, Value>) -> bool {
    DATA_FIELDS
        .iter()
        .any(|key| body.get(*key).is_some_and(truthy))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
