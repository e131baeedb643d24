use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::config::NOT_FOUND_LOG_CAPACITY;
use crate::store::{load_json, save_json, KeyValueStore, StoreError};

const LOG_KEY: &str = "not_found_log";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotFoundEvent {
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted ring of the most recent not-found navigations.
///
/// `count` is what is retained, not a lifetime total.
pub struct NotFoundLog {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
    lock: Mutex<()>,
}

impl NotFoundLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_capacity(store, NOT_FOUND_LOG_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            capacity,
            lock: Mutex::new(()),
        }
    }

    pub fn record(&self, url: impl Into<String>) -> Result<(), StoreError> {
        self.record_at(url, Utc::now())
    }

    pub fn record_at(&self, url: impl Into<String>, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut log: VecDeque<NotFoundEvent> =
            load_json(self.store.as_ref(), LOG_KEY)?.unwrap_or_default();
        let url = url.into();
        debug!(url = %url, "Recording not-found event");
        log.push_back(NotFoundEvent { url, timestamp });
        while log.len() > self.capacity {
            log.pop_front();
        }
        save_json(self.store.as_ref(), LOG_KEY, &log)
    }

    pub fn recent(&self) -> Result<Vec<NotFoundEvent>, StoreError> {
        Ok(load_json(self.store.as_ref(), LOG_KEY)?.unwrap_or_default())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.recent()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    #[test]
    fn test_empty_log() {
        let log = NotFoundLog::new(Arc::new(MemoryStore::new()));
        assert!(log.recent().unwrap().is_empty());
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn test_keeps_last_hundred_in_order() {
        let log = NotFoundLog::new(Arc::new(MemoryStore::new()));
        let start = Utc::now();
        for i in 0..150 {
            log.record_at(format!("https://example.com/missing-{i}"), start + Duration::seconds(i))
                .unwrap();
        }

        let recent = log.recent().unwrap();
        assert_eq!(recent.len(), 100);
        assert_eq!(log.count().unwrap(), 100);
        assert_eq!(recent.first().unwrap().url, "https://example.com/missing-50");
        assert_eq!(recent.last().unwrap().url, "https://example.com/missing-149");
        assert!(recent.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_custom_capacity() {
        let log = NotFoundLog::with_capacity(Arc::new(MemoryStore::new()), 2);
        log.record("/a").unwrap();
        log.record("/b").unwrap();
        log.record("/c").unwrap();
        let urls: Vec<_> = log.recent().unwrap().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["/b", "/c"]);
    }
}
