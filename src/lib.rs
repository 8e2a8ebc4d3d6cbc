//! WordPress Content Audit - Content inventory and site audits over the REST API
//!
//! Pulls every public page, post, custom post type and media item from a
//! WordPress site, derives its archive pages, and runs page-level audits
//! (SEO, accessibility, security headers, theme/plugin fingerprinting,
//! users, broken links, performance).
//!
//! # Example
//!
//! ```no_run
//! use wordpress_content_audit::{Site, aggregate_content};
//!
//! #[tokio::main]
//! async fn main() -> wordpress_content_audit::Result<()> {
//!     let site = Site::new("https://example.com").await?;
//!     let report = aggregate_content(&site).await;
//!     for group in &report.groups {
//!         println!("{}: {} items", group.category, group.items.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod analyzers;
pub mod archive;
pub mod content;
pub mod discovery;
pub mod error;
pub mod export;
pub mod fetch;
pub mod output;
pub mod records;
pub mod report;
pub mod server;
pub mod site;
pub mod store;

pub use analyzers::broken::LinkChecker;
pub use archive::{ArchiveDescriptor, ArchiveKind, ArchiveSet, synthesize_archives};
pub use content::{StageOutcome, aggregate_content, assemble};
pub use discovery::discover_public_types;
pub use error::{Error, Result};
pub use export::{to_csv_string, write_csv};
pub use fetch::fetch_all;
pub use output::{OutputFormat, Render, output_report};
pub use report::{ContentReport, ReportGroup, ReportItem, Summary};
pub use site::{Credentials, Site, SiteBuilder};
pub use store::{ReportStore, StoredReport};
