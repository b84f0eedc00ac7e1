//! Latest version lookups
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - PyPI JSON API adapter
//! - An oracle over `uv pip list --outdated`

mod client;
mod outdated;
mod pypi;

pub use client::HttpClient;
pub use outdated::{parse_outdated_table, OutdatedReportOracle};
pub use pypi::{PyPIAdapter, PYPI_API_URL};

use async_trait::async_trait;
use std::collections::HashMap;

/// Default number of concurrent index requests
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Source of latest package versions
///
/// Lookups never fail: a package that cannot be resolved is simply absent.
#[async_trait]
pub trait VersionOracle: Send + Sync {
    /// Name shown in progress messages
    fn source_name(&self) -> &'static str;

    /// Latest version of one package
    async fn latest_version(&self, package: &str) -> Option<String>;

    /// Latest versions keyed by normalized package name
    async fn latest_versions(&self, packages: &[String]) -> HashMap<String, String>;
}
