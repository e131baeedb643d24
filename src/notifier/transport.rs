use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::error::DeliveryError;

pub const CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub content_type: String,
}

impl OutgoingMail {
    pub fn plain(to: Vec<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body: body.into(),
            content_type: CONTENT_TYPE.to_string(),
        }
    }

    /// RFC 5322 rendering used by the outbox.
    pub fn to_rfc5322(&self) -> String {
        format!(
            "Date: {}\r\nTo: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: {}\r\n\r\n{}",
            Utc::now().to_rfc2822(),
            self.to.join(", "),
            self.subject,
            self.content_type,
            self.body.replace('\n', "\r\n"),
        )
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError>;
}

/// Posts each message as JSON to an HTTP mail relay.
pub struct RelayTransport {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl RelayTransport {
    pub fn new(client: reqwest::Client, endpoint: Url, token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl MailTransport for RelayTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        let mut request = self.client.post(self.endpoint.clone()).json(mail);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(endpoint = %self.endpoint, recipients = mail.to.len(), "Relay accepted message");
        Ok(())
    }
}

/// Writes each message as an `.eml` file into a spool directory.
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl MailTransport for OutboxTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!(
            "{}-{}.eml",
            Utc::now().format("%Y%m%dT%H%M%S"),
            uuid::Uuid::new_v4()
        );
        let path = self.dir.join(name);
        tokio::fs::write(&path, mail.to_rfc5322()).await?;
        info!(path = %path.display(), "Message written to outbox");
        Ok(())
    }
}

/// Keeps sent messages in memory; handy for dry runs and tests.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .map_err(|_| DeliveryError::Transport("memory transport poisoned".into()))?
            .push(mail.clone());
        Ok(())
    }
}
