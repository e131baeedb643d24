use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::state::{SharedState, WeeklyOutcome};

/// Spawn the periodic weekly-delivery check.
pub fn spawn_delivery_trigger(state: SharedState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.config.trigger_interval;
        info!(?period, "Delivery trigger started");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match state.check_and_send_weekly_report(Utc::now()).await {
                Ok(WeeklyOutcome::Sent) => info!("Weekly report sent"),
                Ok(WeeklyOutcome::NotDue) => debug!("Weekly report not due"),
                Err(e) => error!(error = %e, "Weekly report cycle failed"),
            }
        }
    })
}
