use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// Facts exported by the hosting platform. Any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformFacts {
    pub wp_version: Option<String>,
    pub php_version: Option<String>,
    pub plugins: Option<PluginFacts>,
    pub active_theme: Option<ThemeFacts>,
    pub updates: Option<UpdateFacts>,
    pub comments: Option<CommentFacts>,
    pub commerce: Option<CommerceFacts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PluginFacts {
    pub installed: u64,
    pub active: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeFacts {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdateFacts {
    pub plugins: u64,
    pub themes: u64,
    pub core_upgrade: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommentFacts {
    pub pending: u64,
    pub spam: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommerceFacts {
    pub low_stock_threshold: i64,
    pub orders: Vec<OrderFact>,
    pub products: Vec<ProductFact>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderFact {
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProductFact {
    pub manage_stock: bool,
    pub stock: Option<i64>,
}

impl PluginFacts {
    pub fn inactive(&self) -> u64 {
        self.installed.saturating_sub(self.active)
    }
}

impl ThemeFacts {
    pub fn display(&self) -> String {
        format!("{} (version {})", self.name, self.version)
    }
}

impl UpdateFacts {
    pub fn pending(&self) -> u64 {
        self.plugins + self.themes + u64::from(self.core_upgrade)
    }
}

pub trait PlatformSource: Send + Sync {
    fn facts(&self) -> Result<PlatformFacts, SourceError>;
}

/// Fixed facts, for wiring tests or platforms that push a snapshot once.
impl PlatformSource for PlatformFacts {
    fn facts(&self) -> Result<PlatformFacts, SourceError> {
        Ok(self.clone())
    }
}

/// Re-reads the exported facts document on every generation.
pub struct FactsFile {
    path: Option<PathBuf>,
}

impl FactsFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl PlatformSource for FactsFile {
    fn facts(&self) -> Result<PlatformFacts, SourceError> {
        match &self.path {
            Some(path) => load_facts(path),
            None => Err(SourceError::Unavailable("no facts file configured".into())),
        }
    }
}

pub fn load_facts(path: &Path) -> Result<PlatformFacts, SourceError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SourceError::Unavailable(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| SourceError::Malformed(format!("{}: {}", path.display(), e)))
}
