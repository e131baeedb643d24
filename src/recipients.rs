use regex::Regex;
use std::sync::{Arc, LazyLock, Mutex};
use tracing::info;

use crate::error::MonitorError;
use crate::store::{load_json, save_json, KeyValueStore, StoreError};

const RECIPIENTS_KEY: &str = "recipients";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("valid email regex")
});

/// Trim surrounding whitespace; the local part keeps its case, the domain is lowercased.
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_ascii_lowercase()),
        None => trimmed.to_string(),
    }
}

pub fn is_valid_email(address: &str) -> bool {
    address.len() <= 254 && EMAIL_RE.is_match(address)
}

/// Ordered, duplicate-free digest recipients.
pub struct RecipientList {
    store: Arc<dyn KeyValueStore>,
    default_address: String,
    lock: Mutex<()>,
}

impl RecipientList {
    pub fn new(store: Arc<dyn KeyValueStore>, default_address: impl Into<String>) -> Self {
        Self {
            store,
            default_address: default_address.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(load_json(self.store.as_ref(), RECIPIENTS_KEY)?.unwrap_or_default())
    }

    pub fn add(&self, raw: &str) -> Result<String, MonitorError> {
        let email = normalize_email(raw);
        if !is_valid_email(&email) {
            return Err(MonitorError::InvalidRecipient(raw.trim().to_string()));
        }

        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut recipients = self.list()?;
        if recipients.iter().any(|r| r.eq_ignore_ascii_case(&email)) {
            return Err(MonitorError::DuplicateRecipient(email));
        }
        recipients.push(email.clone());
        save_json(self.store.as_ref(), RECIPIENTS_KEY, &recipients)?;
        info!(recipient = %email, "Recipient added");
        Ok(email)
    }

    pub fn remove(&self, raw: &str) -> Result<String, MonitorError> {
        let email = normalize_email(raw);

        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut recipients = self.list()?;
        let index = recipients
            .iter()
            .position(|r| r.eq_ignore_ascii_case(&email))
            .ok_or_else(|| MonitorError::RecipientNotFound(email.clone()))?;
        let removed = recipients.remove(index);
        save_json(self.store.as_ref(), RECIPIENTS_KEY, &recipients)?;
        info!(recipient = %removed, "Recipient removed");
        Ok(removed)
    }

    /// Addresses to deliver to: the list, or the default address when the list is empty.
    /// The fallback is never written back.
    pub fn effective(&self) -> Result<Vec<String>, StoreError> {
        let recipients = self.list()?;
        if recipients.is_empty() {
            Ok(vec![self.default_address.clone()])
        } else {
            Ok(recipients)
        }
    }
}
