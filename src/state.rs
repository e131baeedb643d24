use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{MailConfig, MonitorConfig};
use crate::error::MonitorError;
use crate::integrity::FileIntegrityTracker;
use crate::not_found::NotFoundLog;
use crate::notifier::{MailTransport, Notifier, OutboxTransport, RelayTransport};
use crate::recipients::RecipientList;
use crate::report::{AssemblerParts, ReportAssembler};
use crate::scheduler::DeliveryScheduler;
use crate::sources::{
    CommerceSource, DiskSource, FactsCommerce, FactsFile, FailedLoginCounter, HttpSiteProbe,
    NoCommerce, PlatformSource, SiteProbe, SystemDisk,
};
use crate::store::{KeyValueStore, SqliteStore};

pub type SharedState = Arc<MonitorState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyOutcome {
    Sent,
    NotDue,
}

/// External collaborators the monitor is wired against.
pub struct Collaborators {
    pub store: Arc<dyn KeyValueStore>,
    pub probe: Arc<dyn SiteProbe>,
    pub platform: Arc<dyn PlatformSource>,
    pub disk: Arc<dyn DiskSource>,
    pub transport: Arc<dyn MailTransport>,
}

impl Collaborators {
    /// Production wiring: SQLite state, real HTTP probes, facts file, host disk, configured mail.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.state_db)?);
        let probe = HttpSiteProbe::new(config.probe_timeout)
            .map_err(|e| MonitorError::Other(format!("failed to build HTTP client: {e}")))?;
        let transport: Arc<dyn MailTransport> = match &config.mail {
            MailConfig::Relay { endpoint, token } => {
                let client = reqwest::Client::builder()
                    .timeout(config.probe_timeout)
                    .build()
                    .map_err(|e| MonitorError::Other(format!("failed to build mail client: {e}")))?;
                Arc::new(RelayTransport::new(client, endpoint.clone(), token.clone()))
            }
            MailConfig::Outbox { dir } => Arc::new(OutboxTransport::new(dir.clone())),
        };

        Ok(Self {
            store,
            probe: Arc::new(probe),
            platform: Arc::new(FactsFile::new(config.facts_file.clone())),
            disk: Arc::new(SystemDisk::new(config.site_root.clone())),
            transport,
        })
    }
}

/// Composition root: every component, wired by interface.
pub struct MonitorState {
    pub config: MonitorConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub assembler: ReportAssembler,
    pub scheduler: DeliveryScheduler,
    pub notifier: Notifier,
    pub recipients: Arc<RecipientList>,
    pub not_found: Arc<NotFoundLog>,
    pub failed_logins: Arc<FailedLoginCounter>,
    pub integrity: Arc<FileIntegrityTracker>,
    delivery_lock: Mutex<()>,
}

impl MonitorState {
    pub fn new(config: MonitorConfig, parts: Collaborators) -> Self {
        let store = parts.store;
        let integrity = Arc::new(FileIntegrityTracker::new(store.clone()));
        let not_found = Arc::new(NotFoundLog::new(store.clone()));
        let failed_logins = Arc::new(FailedLoginCounter::new(store.clone()));
        let recipients = Arc::new(RecipientList::new(
            store.clone(),
            config.default_recipient.clone(),
        ));

        let commerce: Arc<dyn CommerceSource> = if config.commerce_enabled {
            Arc::new(FactsCommerce)
        } else {
            Arc::new(NoCommerce)
        };

        let assembler = ReportAssembler::new(AssemblerParts {
            site_url: config.site_url.clone(),
            watched_files: config.watched_files.clone(),
            probe: parts.probe,
            platform: parts.platform,
            disk: parts.disk,
            commerce,
            integrity: integrity.clone(),
            not_found: not_found.clone(),
            failed_logins: failed_logins.clone(),
        });
        let scheduler = DeliveryScheduler::new(store.clone(), config.zone, config.week_start);
        let notifier = Notifier::new(parts.transport, config.site_name.clone());

        Self {
            config,
            store,
            assembler,
            scheduler,
            notifier,
            recipients,
            not_found,
            failed_logins,
            integrity,
            delivery_lock: Mutex::new(()),
        }
    }

    /// Run the gated weekly cycle.
    ///
    /// The last-sent timestamp is recorded as soon as a send was attempted,
    /// whether or not the transport succeeded; a failed send waits for the
    /// next week rather than retrying.
    pub async fn check_and_send_weekly_report(
        &self,
        now: DateTime<Utc>,
    ) -> Result<WeeklyOutcome, MonitorError> {
        let _guard = self.delivery_lock.lock().await;

        if !self.scheduler.due(now)? {
            return Ok(WeeklyOutcome::NotDue);
        }

        let to = self.recipients.effective()?;
        info!(recipients = to.len(), "Weekly report due, generating");
        let report = self.assembler.generate().await;
        let sent = self.notifier.send_report(to, &report).await;
        self.scheduler.mark_sent(now)?;
        sent.map(|()| WeeklyOutcome::Sent).map_err(MonitorError::from)
    }
}
