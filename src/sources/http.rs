use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
    /// Raw body length before any lossy UTF-8 decoding.
    pub size_bytes: usize,
    /// Request start to last body byte.
    pub elapsed: Duration,
}

/// Outbound HTTP against the monitored site.
#[async_trait]
pub trait SiteProbe: Send + Sync {
    /// GET a page and time it end to end.
    async fn fetch(&self, url: &str) -> Result<FetchedPage, SourceError>;

    /// Lightweight existence probe; returns the HTTP status.
    async fn probe(&self, url: &str) -> Result<u16, SourceError>;
}

pub struct HttpSiteProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSiteProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .user_agent(concat!("site-health-monitor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Unavailable(format!("{url}: {err}"))
        }
    }
}

#[async_trait]
impl SiteProbe for HttpSiteProbe {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, SourceError> {
        let start = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| self.classify(url, e))?;
        let elapsed = start.elapsed();

        debug!(url, status, size = bytes.len(), ?elapsed, "Fetched page");
        Ok(FetchedPage {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
            size_bytes: bytes.len(),
            elapsed,
        })
    }

    async fn probe(&self, url: &str) -> Result<u16, SourceError> {
        let resp = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;
        Ok(resp.status().as_u16())
    }
}
