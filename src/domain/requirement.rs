//! PEP 508-style requirement lines
//!
//! Handles the subset of the grammar this tool repins:
//! - `name`
//! - `name[extra1,extra2]`
//! - `name==1.2.3` (the only pinned form)
//! - `name>=1.0,<2.0` and every other operator (tracked, never pinned)
//! - `name==1.2.3; python_version < "3.12"`
//!
//! Direct references (`name @ https://...`, `git+...`, local paths) are skipped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<name>[A-Za-z0-9][A-Za-z0-9_.-]*)(?P<extras>\[[^\]]+\])?\s*(?:(?P<op>===|==|!=|<=|>=|~=|<|>)\s*(?P<ver>[^;]*?))?\s*$",
    )
    .unwrap()
});

static SEPARATOR_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.]+").unwrap());

const DIRECT_REFERENCE_PREFIXES: [&str; 5] = ["file:", "path:", "git+", "hg+", "svn+"];

/// Normalize a package name for comparison (PEP 503)
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RUN_RE.replace_all(name, "-").to_lowercase()
}

/// A parsed direct dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// The line as written in the manifest
    pub raw: String,
    /// Package name as written
    pub name: String,
    /// Extras suffix including brackets, or empty
    pub extras: String,
    /// Exact `==` version, if pinned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<String>,
    /// Environment marker after `;`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

/// Outcome of parsing a single requirement line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRequirement {
    /// Direct reference (VCS, URL, path) outside this tool's concern
    Skip,
    /// Named requirement
    Requirement(Requirement),
}

impl Requirement {
    /// Normalized package name
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Returns true if this requirement is a repin candidate
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Build the `name[extras]==version[; marker]` specifier for a new pin
    pub fn pin_spec(&self, version: &str) -> String {
        let mut spec = format!("{}{}=={}", self.name, self.extras, version);
        if let Some(marker) = &self.marker {
            spec.push_str("; ");
            spec.push_str(marker);
        }
        spec
    }

    /// Name with extras and marker, as shown in reports
    pub fn display_name(&self) -> String {
        let mut display = format!("{}{}", self.name, self.extras);
        if let Some(marker) = &self.marker {
            display.push_str("; ");
            display.push_str(marker);
        }
        display
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw.trim())
    }
}

/// Parse one requirement line
///
/// Returns `None` for blank lines, comments and lines that do not follow the
/// grammar, and `Some(ParsedRequirement::Skip)` for direct references.
pub fn parse_requirement(line: &str) -> Option<ParsedRequirement> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    if trimmed.contains('@')
        || DIRECT_REFERENCE_PREFIXES
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
    {
        return Some(ParsedRequirement::Skip);
    }

    let (left, marker) = match trimmed.split_once(';') {
        Some((left, marker)) => (left, Some(marker.trim().to_string())),
        None => (trimmed, None),
    };

    let caps = REQUIREMENT_RE.captures(left.trim())?;
    let name = caps.name("name")?.as_str().to_string();
    let extras = caps
        .name("extras")
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let op = caps.name("op").map(|m| m.as_str());
    let version = caps.name("ver").map(|m| m.as_str().trim()).unwrap_or("");
    if op.is_some() && version.is_empty() {
        return None;
    }

    let pinned = match op {
        Some("==") if is_exact_version(version) => Some(version.to_string()),
        _ => None,
    };

    Some(ParsedRequirement::Requirement(Requirement {
        raw: line.to_string(),
        name,
        extras,
        pinned,
        marker: marker.filter(|m| !m.is_empty()),
    }))
}

/// A single version with no wildcard, list or whitespace
fn is_exact_version(version: &str) -> bool {
    !version.is_empty()
        && !version.contains('*')
        && !version.contains(',')
        && !version.contains(char::is_whitespace)
}
