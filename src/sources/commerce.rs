use chrono::{DateTime, Duration, Utc};

use super::facts::{CommerceFacts, PlatformFacts};
use crate::config::RECENT_ORDER_WINDOW_DAYS;
use crate::error::SourceError;

const RECENT_ORDER_STATUS: &str = "processing";

/// Optional commerce capability, chosen when the monitor is composed.
///
/// Counts are derived from the same facts snapshot the rest of the report
/// reads, so one report never mixes two versions of the facts document.
pub trait CommerceSource: Send + Sync {
    fn enabled(&self) -> bool;
    fn recent_order_count(&self, facts: &PlatformFacts, now: DateTime<Utc>)
        -> Result<u64, SourceError>;
    fn low_stock_product_count(&self, facts: &PlatformFacts) -> Result<u64, SourceError>;
}

/// Wired in when the site has no commerce integration.
pub struct NoCommerce;

impl CommerceSource for NoCommerce {
    fn enabled(&self) -> bool {
        false
    }

    fn recent_order_count(
        &self,
        _facts: &PlatformFacts,
        _now: DateTime<Utc>,
    ) -> Result<u64, SourceError> {
        Ok(0)
    }

    fn low_stock_product_count(&self, _facts: &PlatformFacts) -> Result<u64, SourceError> {
        Ok(0)
    }
}

/// Commerce counts read from the `commerce` section of the platform facts.
pub struct FactsCommerce;

fn commerce_section(facts: &PlatformFacts) -> Result<&CommerceFacts, SourceError> {
    facts
        .commerce
        .as_ref()
        .ok_or_else(|| SourceError::Unavailable("facts carry no commerce section".into()))
}

impl CommerceSource for FactsCommerce {
    fn enabled(&self) -> bool {
        true
    }

    fn recent_order_count(
        &self,
        facts: &PlatformFacts,
        now: DateTime<Utc>,
    ) -> Result<u64, SourceError> {
        Ok(count_recent_orders(commerce_section(facts)?, now))
    }

    fn low_stock_product_count(&self, facts: &PlatformFacts) -> Result<u64, SourceError> {
        Ok(count_low_stock(commerce_section(facts)?))
    }
}

/// Orders still processing that were created within the recent window.
pub fn count_recent_orders(facts: &CommerceFacts, now: DateTime<Utc>) -> u64 {
    let cutoff = now - Duration::days(RECENT_ORDER_WINDOW_DAYS);
    facts
        .orders
        .iter()
        .filter(|o| o.status == RECENT_ORDER_STATUS && o.created_at > cutoff)
        .count() as u64
}

/// Stock-managed products at or below the store's low-stock threshold.
pub fn count_low_stock(facts: &CommerceFacts) -> u64 {
    facts
        .products
        .iter()
        .filter(|p| p.manage_stock)
        .filter(|p| p.stock.is_some_and(|s| s <= facts.low_stock_threshold))
        .count() as u64
}
