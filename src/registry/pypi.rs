//! PyPI JSON API adapter
//!
//! Fetches the latest version of a package from PyPI.
//! API endpoint: https://pypi.org/pypi/{package}/json

use crate::error::RegistryError;
use crate::registry::{HttpClient, VersionOracle, DEFAULT_CONCURRENCY};
use crate::update::{compare_versions, is_prerelease_version};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// PyPI API base URL
pub const PYPI_API_URL: &str = "https://pypi.org/pypi";

/// PyPI adapter
#[derive(Clone)]
pub struct PyPIAdapter {
    client: HttpClient,
    base_url: String,
    allow_prerelease: bool,
    concurrency: usize,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    info: PackageInfo,
    /// Release files keyed by version
    #[serde(default)]
    releases: HashMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    version: String,
}

impl PyPIAdapter {
    /// Create a new PyPI adapter against the public index
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: PYPI_API_URL.to_string(),
            allow_prerelease: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Use another JSON API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Accept pre-release versions as latest
    pub fn with_prerelease(mut self, allow: bool) -> Self {
        self.allow_prerelease = allow;
        self
    }

    /// Limit concurrent requests during batch lookups
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.base_url, package)
    }

    async fn fetch_latest(&self, package: &str) -> Result<String, RegistryError> {
        let url = self.build_url(package);
        let response: PyPIResponse = self.client.get_json(&url, package, "PyPI").await?;
        Ok(select_latest(response, self.allow_prerelease))
    }
}

/// Pick the version to pin from an index response
///
/// `info.version` wins unless it is a pre-release and pre-releases are not
/// allowed, in which case the newest stable release with uploaded files is
/// used. With no such release `info.version` is kept.
fn select_latest(response: PyPIResponse, allow_prerelease: bool) -> String {
    let latest = response.info.version;
    if allow_prerelease || !is_prerelease_version(&latest) {
        return latest;
    }

    response
        .releases
        .into_iter()
        .filter(|(version, files)| !files.is_empty() && !is_prerelease_version(version))
        .map(|(version, _)| version)
        .max_by(|a, b| compare_versions(a, b).then_with(|| a.cmp(b)))
        .unwrap_or(latest)
}

#[async_trait]
impl VersionOracle for PyPIAdapter {
    fn source_name(&self) -> &'static str {
        "PyPI"
    }

    async fn latest_version(&self, package: &str) -> Option<String> {
        match self.fetch_latest(package).await {
            Ok(version) => Some(version),
            Err(err) => {
                tracing::debug!(package, %err, "latest version lookup failed");
                None
            }
        }
    }

    async fn latest_versions(&self, packages: &[String]) -> HashMap<String, String> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for package in packages {
            let adapter = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let package = package.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let version = adapter.latest_version(&package).await?;
                Some((crate::domain::normalize_name(&package), version))
            });
        }

        let mut latest = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((name, version))) => {
                    latest.insert(name, version);
                }
                Ok(None) => {}
                Err(err) => tracing::debug!(%err, "lookup task failed"),
            }
        }
        latest
    }
}
