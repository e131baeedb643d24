//! Plain-text rendering of a [`Report`] and delivery to the recipient list.

pub mod transport;

use std::fmt::Write;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::DeliveryError;
use crate::report::{DiskReading, Report};
use crate::sources::disk::format_bytes;
pub use transport::{
    MailTransport, MemoryTransport, OutboxTransport, OutgoingMail, RelayTransport, CONTENT_TYPE,
};

pub const TEST_SUBJECT: &str = "Site Health Monitor test email";
pub const TEST_BODY: &str = "This is a test email sent by Site Health Monitor. \
If you are receiving this message, email delivery for health notifications is configured correctly.";
pub const TEST_SENT_MESSAGE: &str = "Test email sent successfully.";

pub fn report_subject(site_name: &str) -> String {
    format!("Weekly health report for {site_name}")
}

fn section(out: &mut String, title: &str, lines: &[(&str, String)]) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "== {title} ==");
    for (label, value) in lines {
        let _ = writeln!(out, "{label}: {value}");
    }
}

/// Deterministic digest layout: one section per signal group, fixed order.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    section(
        &mut out,
        "Site Performance",
        &[
            ("Estimated load time", format!("{} seconds", report.load_time)),
            ("Homepage size", format!("{} KB", report.page_size_kb)),
        ],
    );

    let disk = match report.disk_usage {
        DiskReading::Available(usage) => format!(
            "Used: {} / Total: {}",
            format_bytes(usage.used_bytes),
            format_bytes(usage.total_bytes)
        ),
        DiskReading::Unavailable => "unavailable".to_string(),
    };
    section(
        &mut out,
        "System Status",
        &[
            ("WordPress version", report.wp_version.clone()),
            ("PHP version", report.php_version.clone()),
            ("Disk usage", disk),
            ("Active plugins", report.active_plugin_count.to_string()),
            ("Inactive plugins", report.inactive_plugin_count.to_string()),
            ("Active theme", report.active_theme.clone()),
            ("Pending updates", report.pending_update_count.to_string()),
        ],
    );

    section(
        &mut out,
        "Basic Security",
        &[
            ("Failed login attempts", report.failed_login_count.to_string()),
            ("Modified critical files", report.modified_file_count.to_string()),
        ],
    );

    section(
        &mut out,
        "Comment Moderation",
        &[
            ("Pending comments", report.pending_comment_count.to_string()),
            ("Spam comments", report.spam_comment_count.to_string()),
        ],
    );

    section(
        &mut out,
        "Basic SEO",
        &[
            ("Homepage title", report.home_title.clone()),
            ("Homepage description", report.home_description.clone()),
            ("Recent 404 errors", report.recent_404_count.to_string()),
        ],
    );

    if report.commerce_enabled {
        section(
            &mut out,
            "E-commerce",
            &[
                ("Recent orders (last 7 days)", report.recent_order_count.to_string()),
                ("Low-stock products", report.low_stock_product_count.to_string()),
            ],
        );
    }

    section(
        &mut out,
        "Accessibility and Usability",
        &[("Broken links on homepage", report.broken_link_count.to_string())],
    );

    out
}

/// Renders and dispatches mail. Callers resolve the recipient list first, so
/// every failure here is a delivery failure.
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    site_name: String,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>, site_name: impl Into<String>) -> Self {
        Self {
            transport,
            site_name: site_name.into(),
        }
    }

    pub async fn send_report(&self, to: Vec<String>, report: &Report) -> Result<(), DeliveryError> {
        let mail = OutgoingMail::plain(to, report_subject(&self.site_name), render_report(report));
        self.dispatch(&mail).await
    }

    pub async fn send_test(&self, to: Vec<String>) -> Result<String, DeliveryError> {
        let mail = OutgoingMail::plain(to, TEST_SUBJECT, TEST_BODY);
        self.dispatch(&mail).await?;
        Ok(TEST_SENT_MESSAGE.to_string())
    }

    async fn dispatch(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        match self.transport.send(mail).await {
            Ok(()) => {
                info!(subject = %mail.subject, recipients = mail.to.len(), "Email dispatched");
                Ok(())
            }
            Err(e) => {
                error!(subject = %mail.subject, error = %e, "Email delivery failed");
                Err(e)
            }
        }
    }
}
