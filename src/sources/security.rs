use std::sync::{Arc, Mutex};

use crate::store::{load_json, save_json, KeyValueStore, StoreError};

const FAILED_LOGIN_KEY: &str = "failed_login_count";

/// Failed-login tally maintained by the hosting platform's login hook.
pub struct FailedLoginCounter {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl FailedLoginCounter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        Ok(load_json(self.store.as_ref(), FAILED_LOGIN_KEY)?.unwrap_or(0))
    }

    pub fn increment(&self) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let next = self.count()? + 1;
        save_json(self.store.as_ref(), FAILED_LOGIN_KEY, &next)?;
        Ok(next)
    }

    pub fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        self.store.delete(FAILED_LOGIN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_increment_and_reset() {
        let counter = FailedLoginCounter::new(Arc::new(MemoryStore::new()));
        assert_eq!(counter.count().unwrap(), 0);
        assert_eq!(counter.increment().unwrap(), 1);
        assert_eq!(counter.increment().unwrap(), 2);
        assert_eq!(counter.count().unwrap(), 2);
        counter.reset().unwrap();
        assert_eq!(counter.count().unwrap(), 0);
    }
}
