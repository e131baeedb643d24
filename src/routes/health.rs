use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub site_url: String,
    pub state_store_ok: bool,
    pub last_report_sent_at: Option<String>,
    pub watched_files: usize,
}

/// Overall service status. Pure function extracted for testability.
pub fn determine_overall_status(state_store_ok: bool) -> &'static str {
    if state_store_ok {
        "healthy"
    } else {
        "degraded"
    }
}

/// GET /health: liveness of the monitor itself, not of the monitored site.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let last_sent = state.scheduler.last_sent();
    let state_store_ok = last_sent.is_ok();

    Json(HealthResponse {
        status: determine_overall_status(state_store_ok).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        site_url: state.config.site_url.clone(),
        state_store_ok,
        last_report_sent_at: last_sent.ok().flatten().map(|t| t.to_rfc3339()),
        watched_files: state.config.watched_files.len(),
    })
}
