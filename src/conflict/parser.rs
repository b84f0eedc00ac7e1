//! Workspace conflict extraction from resolver diagnostics
//!
//! uv reports unsatisfiable workspaces as prose. Each known phrasing is a
//! [`DiagnosticClassifier`]; all classifiers run over the whitespace
//! normalized text and share the same acceptance rules:
//! - both sides name the same package (after normalization)
//! - both sides use the same extra
//! - the two members differ

use crate::domain::{normalize_name, WorkspaceConflict};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Phrase uv prints when resolution fails
pub const NO_SOLUTION_MARKER: &str = "No solution found when resolving dependencies";

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// Because common[dev] depends on flake8==7.2.0 and qluster-sdk[dev] depends on flake8==7.3.0
static PAIRED_EXTRAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Because ([^\[]+)\[([^\]]+)\] depends on ([^=]+)==(\S+) and ([^\[]+)\[([^\]]+)\] depends on ([^=]+)==([^\s,]+)",
    )
    .unwrap()
});

// Because common depends on pydantic==2.11.7 and qluster-sdk[dev] depends on
// pydantic==2.11.5, we can conclude that common[dev] and qluster-sdk[dev] are incompatible.
static INCOMPATIBLE_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Because ([A-Za-z0-9][A-Za-z0-9_.-]*) depends on ([^=]+)==([^\s,]+) and ([A-Za-z0-9][A-Za-z0-9_.-]*)\[([^\]]+)\] depends on ([^=]+)==([^\s,]+).*?([A-Za-z0-9][A-Za-z0-9_.-]*)\[([^\]\s]+)\] and ([A-Za-z0-9][A-Za-z0-9_.-]*)\[([^\]\s]+)\] are incompatible",
    )
    .unwrap()
});

/// One side of a conflict as read from the diagnostic
#[derive(Debug, Clone, Copy)]
pub struct PinClaim<'a> {
    pub member: &'a str,
    pub package: &'a str,
    pub version: &'a str,
}

/// Recognizes one diagnostic phrasing
pub trait DiagnosticClassifier: Send + Sync {
    /// Short name used in debug logs
    fn name(&self) -> &'static str;

    /// Extract conflicts from whitespace-normalized diagnostic text
    fn classify(&self, normalized: &str) -> Vec<WorkspaceConflict>;
}

/// `Because a[x] depends on p==1 and b[x] depends on p==2`
pub struct PairedExtrasClassifier;

impl DiagnosticClassifier for PairedExtrasClassifier {
    fn name(&self) -> &'static str {
        "paired-extras"
    }

    fn classify(&self, normalized: &str) -> Vec<WorkspaceConflict> {
        PAIRED_EXTRAS_RE
            .captures_iter(normalized)
            .filter_map(|caps| {
                let extra = caps[2].trim();
                if extra != caps[6].trim() {
                    return None;
                }
                accept(
                    extra,
                    PinClaim {
                        member: &caps[1],
                        package: &caps[3],
                        version: &caps[4],
                    },
                    PinClaim {
                        member: &caps[5],
                        package: &caps[7],
                        version: &caps[8],
                    },
                )
            })
            .collect()
    }
}

/// `Because a depends on p==1 and b[x] depends on p==2, ... a[x] and b[x] are incompatible`
pub struct IncompatibleClauseClassifier;

impl DiagnosticClassifier for IncompatibleClauseClassifier {
    fn name(&self) -> &'static str {
        "incompatible-clause"
    }

    fn classify(&self, normalized: &str) -> Vec<WorkspaceConflict> {
        INCOMPATIBLE_CLAUSE_RE
            .captures_iter(normalized)
            .filter_map(|caps| {
                let (m1, m2) = (&caps[1], &caps[4]);
                let extra = caps[5].trim();
                let clause_matches =
                    &caps[8] == m1 && &caps[10] == m2 && &caps[9] == extra && &caps[11] == extra;
                if !clause_matches {
                    return None;
                }
                accept(
                    extra,
                    PinClaim {
                        member: m1,
                        package: &caps[2],
                        version: &caps[3],
                    },
                    PinClaim {
                        member: m2,
                        package: &caps[6],
                        version: &caps[7],
                    },
                )
            })
            .collect()
    }
}

/// Shared acceptance check for two claims under one extra
fn accept(extra: &str, first: PinClaim<'_>, second: PinClaim<'_>) -> Option<WorkspaceConflict> {
    let package = first.package.trim();
    if normalize_name(package) != normalize_name(second.package.trim()) {
        return None;
    }
    WorkspaceConflict::new(
        package,
        extra,
        [
            (first.member.trim(), first.version.trim()),
            (second.member.trim(), second.version.trim()),
        ],
    )
}

/// Classifiers in the order their results are reported
pub fn classifiers() -> [&'static dyn DiagnosticClassifier; 2] {
    [&PairedExtrasClassifier, &IncompatibleClauseClassifier]
}

/// Parse workspace conflicts from a failed command's diagnostic
///
/// Returns `None` when the text does not report a failed resolution, and
/// `Some` (possibly empty) otherwise. Duplicate conflicts reported by more
/// than one phrasing are kept once.
pub fn parse_workspace_conflicts(diagnostic: &str) -> Option<Vec<WorkspaceConflict>> {
    if !diagnostic.contains(NO_SOLUTION_MARKER) {
        return None;
    }
    let normalized = WHITESPACE_RE.replace_all(diagnostic, " ");

    let mut seen = HashSet::new();
    let mut conflicts = Vec::new();
    for classifier in classifiers() {
        let found = classifier.classify(&normalized);
        tracing::debug!(classifier = classifier.name(), found = found.len(), "classified diagnostic");
        for conflict in found {
            if seen.insert(conflict.dedup_key()) {
                conflicts.push(conflict);
            }
        }
    }
    Some(conflicts)
}
