use chrono::{TimeZone, Utc, Weekday};
use std::sync::Arc;
use tempfile::TempDir;

use site_health_monitor::config::ScheduleZone;
use site_health_monitor::integrity::FileIntegrityTracker;
use site_health_monitor::not_found::NotFoundLog;
use site_health_monitor::recipients::RecipientList;
use site_health_monitor::scheduler::DeliveryScheduler;
use site_health_monitor::store::{KeyValueStore, SqliteStore};

fn open(dir: &TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(SqliteStore::open(&dir.path().join("state").join("state.db")).unwrap())
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let watched = dir.path().join("wp-login.php");
    std::fs::write(&watched, "v1").unwrap();
    let sent_at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();

    {
        let store = open(&dir);
        RecipientList::new(store.clone(), "admin@example.com")
            .add("ops@example.com")
            .unwrap();
        NotFoundLog::new(store.clone()).record("https://example.com/x").unwrap();
        FileIntegrityTracker::new(store.clone()).check(&[watched.clone()]);
        DeliveryScheduler::new(store, ScheduleZone::Named(chrono_tz::UTC), Weekday::Sun)
            .mark_sent(sent_at)
            .unwrap();
    }

    std::fs::write(&watched, "v2").unwrap();

    let store = open(&dir);
    assert_eq!(
        RecipientList::new(store.clone(), "admin@example.com").list().unwrap(),
        vec!["ops@example.com"]
    );
    assert_eq!(NotFoundLog::new(store.clone()).count().unwrap(), 1);
    assert_eq!(
        FileIntegrityTracker::new(store.clone())
            .check(&[watched])
            .modified_count(),
        1
    );
    let scheduler = DeliveryScheduler::new(store, ScheduleZone::Named(chrono_tz::UTC), Weekday::Sun);
    assert_eq!(scheduler.last_sent().unwrap(), Some(sent_at));
    assert!(!scheduler.due(sent_at).unwrap());
}
