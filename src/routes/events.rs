use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{success, Envelope};
use crate::error::MonitorError;
use crate::not_found::NotFoundEvent;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct NotFoundRequest {
    pub url: String,
}

/// POST /events/not-found: the platform reports a 404 navigation.
pub async fn record_not_found(
    State(state): State<SharedState>,
    payload: Result<Json<NotFoundRequest>, JsonRejection>,
) -> Result<Json<Envelope<usize>>, MonitorError> {
    let Json(body) = payload?;
    state.not_found.record(body.url)?;
    Ok(success(state.not_found.count()?))
}

/// GET /events/not-found
pub async fn list_not_found(
    State(state): State<SharedState>,
) -> Result<Json<Envelope<Vec<NotFoundEvent>>>, MonitorError> {
    Ok(success(state.not_found.recent()?))
}

/// POST /security/failed-logins: the platform's login hook reports a failure.
pub async fn record_failed_login(
    State(state): State<SharedState>,
) -> Result<Json<Envelope<u64>>, MonitorError> {
    Ok(success(state.failed_logins.increment()?))
}

/// DELETE /security/failed-logins: the platform's daily job clears the window.
pub async fn reset_failed_logins(
    State(state): State<SharedState>,
) -> Result<Json<Envelope<u64>>, MonitorError> {
    state.failed_logins.reset()?;
    Ok(success(state.failed_logins.count()?))
}
