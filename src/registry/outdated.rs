//! Latest versions from the package manager's outdated report
//!
//! Runs `uv pip list --outdated` once per process and answers lookups from
//! the parsed table.

use crate::domain::normalize_name;
use crate::package_manager::{CommandRunner, UvCommand};
use crate::registry::VersionOracle;
use crate::update::is_prerelease_version;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, OnceLock};

static COLUMN_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());
static PACKAGE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bPackage\b").unwrap());
static LATEST_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bLatest\b").unwrap());

/// Oracle backed by `uv pip list --outdated`
pub struct OutdatedReportOracle {
    runner: Arc<dyn CommandRunner>,
    allow_prerelease: bool,
    report: OnceLock<HashMap<String, String>>,
}

impl OutdatedReportOracle {
    /// Create an oracle that runs the report through `runner`
    pub fn new(runner: Arc<dyn CommandRunner>, allow_prerelease: bool) -> Self {
        Self {
            runner,
            allow_prerelease,
            report: OnceLock::new(),
        }
    }

    fn report(&self) -> &HashMap<String, String> {
        self.report.get_or_init(|| {
            let output = match self.runner.run(&UvCommand::ListOutdated) {
                Ok(output) if output.success() => output,
                Ok(output) => {
                    tracing::debug!(code = ?output.code, stderr = %output.stderr.trim(), "outdated report failed");
                    return HashMap::new();
                }
                Err(err) => {
                    tracing::debug!(%err, "outdated report failed");
                    return HashMap::new();
                }
            };
            let mut table = parse_outdated_table(&output.stdout);
            if !self.allow_prerelease {
                table.retain(|_, version| !is_prerelease_version(version));
            }
            tracing::debug!(packages = table.len(), "parsed outdated report");
            table
        })
    }
}

#[async_trait]
impl VersionOracle for OutdatedReportOracle {
    fn source_name(&self) -> &'static str {
        "uv pip list --outdated"
    }

    async fn latest_version(&self, package: &str) -> Option<String> {
        let found = self.report().get(&normalize_name(package)).cloned();
        if found.is_none() {
            tracing::debug!(package, "package not in outdated report");
        }
        found
    }

    async fn latest_versions(&self, packages: &[String]) -> HashMap<String, String> {
        let report = self.report();
        packages
            .iter()
            .map(|p| normalize_name(p))
            .filter_map(|name| report.get(&name).map(|v| (name, v.clone())))
            .collect()
    }
}

/// Parse an outdated table into normalized name to latest version
///
/// Rows come after the header carrying `Package` and `Latest`, or from the
/// first line if there is no header. Columns are separated by two or more
/// spaces; the third column is the latest version.
pub fn parse_outdated_table(text: &str) -> HashMap<String, String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let start = lines
        .iter()
        .position(|l| PACKAGE_HEADER_RE.is_match(l) && LATEST_HEADER_RE.is_match(l))
        .map_or(0, |i| i + 1);

    let mut latest = HashMap::new();
    for line in &lines[start..] {
        if line.chars().all(|c| c == '-') {
            continue;
        }
        let cols: Vec<&str> = COLUMN_SPLIT_RE.split(line).collect();
        if cols.len() < 3 {
            continue;
        }
        if cols.iter().all(|c| c.chars().all(|ch| ch == '-')) {
            continue;
        }
        if let Some(version) = cols[2].split_whitespace().next() {
            latest.insert(normalize_name(cols[0]), version.to_string());
        }
    }
    latest
}
