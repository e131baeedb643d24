use chrono::Utc;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::integrity::FileIntegrityTracker;
use crate::not_found::NotFoundLog;
use crate::sources::{
    CommerceSource, DiskSource, DiskUsage, FailedLoginCounter, FetchedPage, PlatformFacts,
    PlatformSource, SiteProbe,
};

pub const NOT_AVAILABLE: &str = "not available";
pub const NOT_FOUND: &str = "not found";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>(.*?)</title>").expect("valid title regex"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta name="description" content="(.*?)""#).expect("valid description regex")
});
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\s+(?:[^>]*?\s+)?href="([^"]*)""#).expect("valid link regex")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiskReading {
    Available(DiskUsage),
    Unavailable,
}

impl Serialize for DiskReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DiskReading::Available(usage) => usage.serialize(serializer),
            DiskReading::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

/// One point-in-time snapshot of every health signal.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub load_time: f64,
    pub page_size_kb: f64,
    pub wp_version: String,
    pub php_version: String,
    pub disk_usage: DiskReading,
    pub active_plugin_count: u64,
    pub inactive_plugin_count: u64,
    pub active_theme: String,
    pub pending_update_count: u64,
    pub failed_login_count: u64,
    pub modified_file_count: u64,
    pub pending_comment_count: u64,
    pub spam_comment_count: u64,
    pub home_title: String,
    pub home_description: String,
    pub recent_404_count: u64,
    pub commerce_enabled: bool,
    pub recent_order_count: u64,
    pub low_stock_product_count: u64,
    pub broken_link_count: u64,
}

/// Round to two decimals, matching the dashboard's display precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn extract_title(body: &str) -> Option<String> {
    TITLE_RE.captures(body).map(|c| c[1].to_string())
}

pub fn extract_description(body: &str) -> Option<String> {
    DESCRIPTION_RE.captures(body).map(|c| c[1].to_string())
}

pub fn extract_links(body: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect()
}

/// Absolute links on the site's own origin (scheme, host and port) that sit
/// under the site's base path.
pub fn same_origin_links(body: &str, site_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(site_url) else {
        warn!(site_url, "Site URL does not parse, skipping link scan");
        return Vec::new();
    };
    extract_links(body)
        .into_iter()
        .filter(|link| Url::parse(link).is_ok_and(|url| is_under(&base, &url)))
        .collect()
}

fn is_under(base: &Url, url: &Url) -> bool {
    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return false;
    }
    let prefix = base.path().trim_end_matches('/');
    prefix.is_empty()
        || url.path() == prefix
        || url
            .path()
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub struct ReportAssembler {
    site_url: String,
    watched_files: Vec<PathBuf>,
    probe: Arc<dyn SiteProbe>,
    platform: Arc<dyn PlatformSource>,
    disk: Arc<dyn DiskSource>,
    commerce: Arc<dyn CommerceSource>,
    integrity: Arc<FileIntegrityTracker>,
    not_found: Arc<NotFoundLog>,
    failed_logins: Arc<FailedLoginCounter>,
}

pub struct AssemblerParts {
    pub site_url: String,
    pub watched_files: Vec<PathBuf>,
    pub probe: Arc<dyn SiteProbe>,
    pub platform: Arc<dyn PlatformSource>,
    pub disk: Arc<dyn DiskSource>,
    pub commerce: Arc<dyn CommerceSource>,
    pub integrity: Arc<FileIntegrityTracker>,
    pub not_found: Arc<NotFoundLog>,
    pub failed_logins: Arc<FailedLoginCounter>,
}

impl ReportAssembler {
    pub fn new(parts: AssemblerParts) -> Self {
        Self {
            site_url: parts.site_url,
            watched_files: parts.watched_files,
            probe: parts.probe,
            platform: parts.platform,
            disk: parts.disk,
            commerce: parts.commerce,
            integrity: parts.integrity,
            not_found: parts.not_found,
            failed_logins: parts.failed_logins,
        }
    }

    /// Gather every signal into a fresh report. Sub-fetch failures only degrade
    /// the fields they feed.
    pub async fn generate(&self) -> Report {
        // The homepage is fetched once and shared by every field derived from it.
        let homepage = match self.probe.fetch(&self.site_url).await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(url = %self.site_url, error = %e, "Homepage unavailable");
                None
            }
        };

        // Likewise one facts snapshot feeds the platform and commerce fields.
        let facts = self.platform.facts().unwrap_or_else(|e| {
            warn!(error = %e, "Platform facts unavailable");
            PlatformFacts::default()
        });

        let disk_usage = match self.disk.usage() {
            Ok(usage) => DiskReading::Available(usage),
            Err(e) => {
                warn!(error = %e, "Disk usage unavailable");
                DiskReading::Unavailable
            }
        };

        let failed_login_count = self.failed_logins.count().unwrap_or_else(|e| {
            warn!(error = %e, "Failed-login counter unavailable");
            0
        });

        let integrity = self.integrity.check(&self.watched_files);

        let recent_404_count = self.not_found.count().unwrap_or_else(|e| {
            warn!(error = %e, "Not-found log unavailable");
            0
        }) as u64;

        let commerce_enabled = self.commerce.enabled();
        let recent_order_count = self
            .commerce
            .recent_order_count(&facts, Utc::now())
            .unwrap_or_else(|e| {
                warn!(error = %e, "Recent orders unavailable");
                0
            });
        let low_stock_product_count = self
            .commerce
            .low_stock_product_count(&facts)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Low-stock products unavailable");
                0
            });

        let broken_link_count = match &homepage {
            Some(page) => self.count_broken_links(&page.body).await,
            None => 0,
        };

        let (load_time, page_size_kb, home_title, home_description) = homepage_fields(homepage.as_ref());
        let plugins = facts.plugins.unwrap_or_default();
        let comments = facts.comments.unwrap_or_default();

        let report = Report {
            load_time,
            page_size_kb,
            wp_version: facts.wp_version.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            php_version: facts.php_version.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            disk_usage,
            active_plugin_count: plugins.active,
            inactive_plugin_count: plugins.inactive(),
            active_theme: facts
                .active_theme
                .map(|t| t.display())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            pending_update_count: facts.updates.map(|u| u.pending()).unwrap_or(0),
            failed_login_count,
            modified_file_count: integrity.modified_count() as u64,
            pending_comment_count: comments.pending,
            spam_comment_count: comments.spam,
            home_title,
            home_description,
            recent_404_count,
            commerce_enabled,
            recent_order_count,
            low_stock_product_count,
            broken_link_count,
        };

        info!(
            load_time = report.load_time,
            modified_files = report.modified_file_count,
            broken_links = report.broken_link_count,
            "Health report generated"
        );
        report
    }

    /// Probe each same-origin link; errors and 404s count as broken.
    async fn count_broken_links(&self, body: &str) -> u64 {
        let mut broken = 0;
        for link in same_origin_links(body, &self.site_url) {
            match self.probe.probe(&link).await {
                Ok(404) => {
                    debug!(link = %link, "Broken link (404)");
                    broken += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(link = %link, error = %e, "Broken link (probe failed)");
                    broken += 1;
                }
            }
        }
        broken
    }
}

fn homepage_fields(page: Option<&FetchedPage>) -> (f64, f64, String, String) {
    match page {
        Some(page) => (
            round2(page.elapsed.as_secs_f64()),
            round2(page.size_bytes as f64 / 1024.0),
            extract_title(&page.body).unwrap_or_else(|| NOT_FOUND.to_string()),
            extract_description(&page.body).unwrap_or_else(|| NOT_FOUND.to_string()),
        ),
        None => (
            0.0,
            0.0,
            NOT_AVAILABLE.to_string(),
            NOT_AVAILABLE.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title_case_insensitive() {
        assert_eq!(extract_title("<TITLE>Shop</TITLE>").as_deref(), Some("Shop"));
        assert_eq!(extract_title("<html></html>"), None);
    }

    #[test]
    fn test_extract_description() {
        let body = r#"<head><meta name="description" content="Fresh bread daily"></head>"#;
        assert_eq!(extract_description(body).as_deref(), Some("Fresh bread daily"));
        assert_eq!(extract_description(r#"<meta name="keywords" content="x">"#), None);
    }

    #[test]
    fn test_same_origin_filter() {
        let body = r#"
            <a href="https://example.com/about">About</a>
            <a class="nav" href="https://example.com/missing">Missing</a>
            <a href="https://other.org/">Other</a>
            <a href="/relative">Relative</a>
            <link href="https://example.com/style.css">
        "#;
        assert_eq!(extract_links(body).len(), 4);
        assert_eq!(
            same_origin_links(body, "https://example.com"),
            vec!["https://example.com/about", "https://example.com/missing"]
        );
    }

    #[test]
    fn test_same_origin_rejects_lookalike_hosts() {
        let body = r#"
            <a href="https://example.com.evil.org/x">x</a>
            <a href="https://example.community/y">y</a>
            <a href="http://example.com/plain">plain</a>
            <a href="https://example.com:8443/port">port</a>
            <a href="https://EXAMPLE.com/upper">upper</a>
            <a href="https://example.com:443/explicit">explicit</a>
        "#;
        assert_eq!(
            same_origin_links(body, "https://example.com"),
            vec!["https://EXAMPLE.com/upper", "https://example.com:443/explicit"]
        );
    }

    #[test]
    fn test_same_origin_respects_base_path() {
        let body = r#"
            <a href="https://example.com/blog">root</a>
            <a href="https://example.com/blog/post">post</a>
            <a href="https://example.com/blogroll">sibling</a>
            <a href="https://example.com/shop">shop</a>
        "#;
        assert_eq!(
            same_origin_links(body, "https://example.com/blog"),
            vec!["https://example.com/blog", "https://example.com/blog/post"]
        );
        assert!(same_origin_links(body, "not a url").is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(120_000.0 / 1024.0), 117.19);
        assert_eq!(round2(0.8), 0.8);
        assert_eq!(round2(0.123_456), 0.12);
    }

    #[test]
    fn test_disk_reading_serialization() {
        let available = DiskReading::Available(DiskUsage {
            used_bytes: 10,
            total_bytes: 20,
        });
        assert_eq!(
            serde_json::to_value(available).unwrap(),
            serde_json::json!({"used_bytes": 10, "total_bytes": 20})
        );
        assert_eq!(
            serde_json::to_value(DiskReading::Unavailable).unwrap(),
            serde_json::json!("unavailable")
        );
    }
}
