//! Thin fetchers for the raw facts a report is assembled from.
//!
//! Every source returns `Result<_, SourceError>` so the assembler can degrade
//! the fields a failing source feeds without aborting the whole report.

pub mod commerce;
pub mod disk;
pub mod facts;
pub mod http;
pub mod security;

pub use commerce::{CommerceSource, FactsCommerce, NoCommerce};
pub use disk::{DiskSource, DiskUsage, SystemDisk};
pub use facts::{FactsFile, PlatformFacts, PlatformSource};
pub use http::{FetchedPage, HttpSiteProbe, SiteProbe};
pub use security::FailedLoginCounter;
