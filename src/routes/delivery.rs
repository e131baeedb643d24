use axum::extract::State;
use axum::Json;
use chrono::Utc;

use super::{success, Envelope};
use crate::error::MonitorError;
use crate::state::{SharedState, WeeklyOutcome};

/// POST /recipients/test: send the fixed test message to the current recipients.
pub async fn send_test_email(
    State(state): State<SharedState>,
) -> Result<Json<Envelope<String>>, MonitorError> {
    let to = state.recipients.effective()?;
    Ok(success(state.notifier.send_test(to).await?))
}

/// POST /weekly/check: let platform traffic drive the weekly gate.
pub async fn check_weekly(
    State(state): State<SharedState>,
) -> Result<Json<Envelope<WeeklyOutcome>>, MonitorError> {
    Ok(success(state.check_and_send_weekly_report(Utc::now()).await?))
}
