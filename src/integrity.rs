use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::store::{KeyValueStore, StoreError};

const BASELINE_KEY_PREFIX: &str = "file_hash:";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrityReport {
    pub modified: BTreeSet<String>,
}

impl IntegrityReport {
    pub fn modified_count(&self) -> usize {
        self.modified.len()
    }
}

/// Tracks a content-hash baseline per watched file and reports drift once per change.
pub struct FileIntegrityTracker {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

pub fn file_identifier(path: &Path) -> String {
    path.display().to_string()
}

pub fn baseline_key(identifier: &str) -> String {
    format!("{BASELINE_KEY_PREFIX}{identifier}")
}

/// SHA-256 of a file's contents, hex encoded.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

impl FileIntegrityTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn check(&self, files: &[PathBuf]) -> IntegrityReport {
        let _guard = match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut report = IntegrityReport::default();
        for path in files {
            let id = file_identifier(path);
            let current = match hash_file(path) {
                Ok(hash) => hash,
                Err(e) => {
                    warn!(file = %id, error = %e, "Watched file unreadable, skipping");
                    continue;
                }
            };

            match self.compare_and_rebaseline(&id, &current) {
                Ok(true) => {
                    warn!(file = %id, "Watched file modified since last check");
                    report.modified.insert(id);
                }
                Ok(false) => debug!(file = %id, "Watched file unchanged"),
                Err(e) => warn!(file = %id, error = %e, "Baseline store unavailable"),
            }
        }
        report
    }

    /// Returns whether `current` differs from a stored baseline; always leaves `current` stored.
    fn compare_and_rebaseline(&self, id: &str, current: &str) -> Result<bool, StoreError> {
        let key = baseline_key(id);
        let drifted = match self.store.get(&key)? {
            Some(stored) => stored != current,
            None => false,
        };
        self.store.put(&key, current)?;
        Ok(drifted)
    }

    pub fn baseline(&self, path: &Path) -> Result<Option<String>, StoreError> {
        self.store.get(&baseline_key(&file_identifier(path)))
    }
}
