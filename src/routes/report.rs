use axum::extract::State;
use axum::Json;

use super::{success, Envelope};
use crate::report::Report;
use crate::state::SharedState;

/// GET /report: generate a fresh snapshot for the dashboard.
pub async fn get_report(State(state): State<SharedState>) -> Json<Envelope<Report>> {
    success(state.assembler.generate().await)
}
