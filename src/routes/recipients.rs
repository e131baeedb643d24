use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{success, Envelope};
use crate::error::MonitorError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// GET /recipients
pub async fn list_recipients(
    State(state): State<SharedState>,
) -> Result<Json<Envelope<Vec<String>>>, MonitorError> {
    Ok(success(state.recipients.list()?))
}

/// POST /recipients
pub async fn add_recipient(
    State(state): State<SharedState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Envelope<String>>, MonitorError> {
    let Json(body) = payload?;
    Ok(success(state.recipients.add(&body.email)?))
}

/// DELETE /recipients
pub async fn remove_recipient(
    State(state): State<SharedState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<Envelope<String>>, MonitorError> {
    let Json(body) = payload?;
    Ok(success(state.recipients.remove(&body.email)?))
}
