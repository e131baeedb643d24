use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Utc, Weekday};
use std::sync::Arc;
use tracing::debug;

use crate::config::ScheduleZone;
use crate::store::{load_json, save_json, KeyValueStore, StoreError};

const LAST_SENT_KEY: &str = "last_report_sent";

/// Date-based gate for the weekly digest.
///
/// Due only on the first day of the week and only if nothing was sent since
/// that day began, so repeated checks on the same day never double-send and a
/// multi-week outage produces a single catch-up send.
pub struct DeliveryScheduler {
    store: Arc<dyn KeyValueStore>,
    zone: ScheduleZone,
    week_start: Weekday,
}

impl DeliveryScheduler {
    pub fn new(store: Arc<dyn KeyValueStore>, zone: ScheduleZone, week_start: Weekday) -> Self {
        Self {
            store,
            zone,
            week_start,
        }
    }

    pub fn due(&self, now: DateTime<Utc>) -> Result<bool, StoreError> {
        if self.local_date(now).weekday() != self.week_start {
            return Ok(false);
        }
        let week_start = self.start_of_week(now);
        let due = match self.last_sent()? {
            Some(last) => last < week_start,
            None => true,
        };
        debug!(%now, %week_start, due, "Evaluated weekly delivery gate");
        Ok(due)
    }

    pub fn last_sent(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        load_json(self.store.as_ref(), LAST_SENT_KEY)
    }

    pub fn mark_sent(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        save_json(self.store.as_ref(), LAST_SENT_KEY, &at)
    }

    /// Seed the last-sent timestamp on first start so a fresh install waits a week.
    /// Returns whether a value was written.
    pub fn initialize(&self, now: DateTime<Utc>) -> Result<bool, StoreError> {
        if self.last_sent()?.is_some() {
            return Ok(false);
        }
        self.mark_sent(now)?;
        Ok(true)
    }

    /// Local midnight of the most recent week-start day (today if today is one).
    pub fn start_of_week(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.local_date(now);
        let days_back = (today.weekday().num_days_from_monday() + 7
            - self.week_start.num_days_from_monday())
            % 7;
        let start = today - Duration::days(i64::from(days_back));
        match self.zone {
            ScheduleZone::Local => local_midnight(&chrono::Local, start),
            ScheduleZone::Named(tz) => local_midnight(&tz, start),
        }
    }

    fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        match self.zone {
            ScheduleZone::Local => now.with_timezone(&chrono::Local).date_naive(),
            ScheduleZone::Named(tz) => now.with_timezone(&tz).date_naive(),
        }
    }
}

/// First instant of `date` in `tz`. A DST gap at midnight moves to the first hour that exists.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    (0..24)
        .filter_map(|hour| date.and_hms_opt(hour, 0, 0))
        .find_map(|naive| match tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => Some(t),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => None,
        })
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)))
}
