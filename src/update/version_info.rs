//! Version string helpers
//!
//! Only two questions are ever asked about a version: is it a pre-release,
//! and which of two stable versions is newer. Full PEP 440 ordering is left
//! to the package manager.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static PRERELEASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(a|b|rc|alpha|beta|dev|pre)\d*").unwrap());

/// Returns true if the version carries a pre-release or dev marker
pub fn is_prerelease_version(version: &str) -> bool {
    PRERELEASE_RE.is_match(version)
}

/// Compare two version strings by their numeric parts
///
/// Non-numeric parts are ignored; when all shared parts are equal the version
/// with more parts is greater.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse_parts = |s: &str| -> Vec<u64> {
        let s = s.strip_prefix('v').unwrap_or(s);
        s.split(['.', '-']).filter_map(|p| p.parse().ok()).collect()
    };

    let parts_a = parse_parts(a);
    let parts_b = parse_parts(b);

    for (pa, pb) in parts_a.iter().zip(parts_b.iter()) {
        match pa.cmp(pb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    parts_a.len().cmp(&parts_b.len())
}
