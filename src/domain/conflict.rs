//! Workspace conflict model
//!
//! A conflict is one package pinned differently by two or more workspace
//! members under the same extra. A resolution gathers the conflicts of one
//! failed `uv add` together with the version each package is aligned to.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::normalize_name;

/// One package pinned differently across workspace members
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceConflict {
    package_name: String,
    extra_name: String,
    pins: BTreeMap<String, String>,
}

impl WorkspaceConflict {
    /// Creates a conflict from `(member, version)` pairs
    ///
    /// Returns `None` unless at least two distinct members are named.
    pub fn new<I, M, V>(
        package_name: impl Into<String>,
        extra_name: impl Into<String>,
        pins: I,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = (M, V)>,
        M: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (member, version) in pins {
            let member = member.into();
            if map.contains_key(&member) {
                return None;
            }
            map.insert(member, version.into());
        }
        if map.len() < 2 {
            return None;
        }
        Some(Self {
            package_name: package_name.into(),
            extra_name: extra_name.into(),
            pins: map,
        })
    }

    /// Package name as reported by the package manager
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Extra both members declare the package under
    pub fn extra_name(&self) -> &str {
        &self.extra_name
    }

    /// Member name to pinned version, sorted by member
    pub fn pins(&self) -> &BTreeMap<String, String> {
        &self.pins
    }

    /// Members named by this conflict
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }

    /// Returns true if the member takes part in this conflict
    pub fn involves(&self, member: &str) -> bool {
        self.pins.contains_key(member)
    }

    /// Lexicographically largest pin among the members
    pub fn max_pin(&self) -> &str {
        self.pins
            .values()
            .map(String::as_str)
            .max()
            .unwrap_or_default()
    }

    /// Identity used to drop duplicate reports of the same conflict
    pub fn dedup_key(&self) -> (String, String, Vec<String>) {
        (
            normalize_name(&self.package_name),
            self.extra_name.clone(),
            self.pins.keys().cloned().collect(),
        )
    }
}

impl fmt::Display for WorkspaceConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sides: Vec<String> = self
            .pins
            .iter()
            .map(|(member, version)| format!("{}(=={})", member, version))
            .collect();
        write!(f, "{}: {}", self.package_name, sides.join(" ↔ "))
    }
}

/// The plan for aligning every conflicting member on one version per package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictResolution {
    extra_name: String,
    conflicts: Vec<WorkspaceConflict>,
    target_versions: BTreeMap<String, String>,
    affected_members: BTreeSet<String>,
}

impl ConflictResolution {
    /// Creates a resolution plan
    ///
    /// Returns `None` when there are no conflicts, the conflicts name more than
    /// one extra, or a conflicting package has no target version.
    pub fn new(
        conflicts: Vec<WorkspaceConflict>,
        target_versions: BTreeMap<String, String>,
    ) -> Option<Self> {
        let extra_name = conflicts.first()?.extra_name.clone();
        if conflicts.iter().any(|c| {
            c.extra_name != extra_name || !target_versions.contains_key(&c.package_name)
        }) {
            return None;
        }
        let affected_members = conflicts
            .iter()
            .flat_map(|c| c.pins.keys().cloned())
            .collect();
        let target_versions = target_versions
            .into_iter()
            .filter(|(pkg, _)| conflicts.iter().any(|c| &c.package_name == pkg))
            .collect();
        Some(Self {
            extra_name,
            conflicts,
            target_versions,
            affected_members,
        })
    }

    /// Extra shared by the conflicts
    pub fn extra_name(&self) -> &str {
        &self.extra_name
    }

    /// Conflicts in report order
    pub fn conflicts(&self) -> &[WorkspaceConflict] {
        &self.conflicts
    }

    /// Package name to aligned version
    pub fn target_versions(&self) -> &BTreeMap<String, String> {
        &self.target_versions
    }

    /// Target version for a package
    pub fn target_for(&self, package: &str) -> Option<&str> {
        self.target_versions.get(package).map(String::as_str)
    }

    /// Every member named by any conflict, sorted
    pub fn affected_members(&self) -> &BTreeSet<String> {
        &self.affected_members
    }

    /// Conflicts that name the given member
    pub fn conflicts_for<'a>(
        &'a self,
        member: &'a str,
    ) -> impl Iterator<Item = &'a WorkspaceConflict> + 'a {
        self.conflicts.iter().filter(move |c| c.involves(member))
    }
}
