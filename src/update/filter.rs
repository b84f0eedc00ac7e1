//! Group filter configuration
//!
//! Built from the `--only-groups` option: a comma separated list of group
//! labels, where `main` addresses `[project] dependencies`.

use crate::domain::DependencyGroup;

/// Restricts which dependency groups are repinned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFilter {
    /// Labels to keep (empty means all)
    only: Vec<String>,
}

impl GroupFilter {
    /// Create a filter that keeps every group
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma separated list, ignoring blanks
    pub fn parse(list: &str) -> Self {
        Self {
            only: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns true if no restriction applies
    pub fn is_unrestricted(&self) -> bool {
        self.only.is_empty()
    }

    /// Check if a group should be processed
    pub fn matches(&self, group: &DependencyGroup) -> bool {
        self.is_unrestricted() || self.only.iter().any(|label| label == group.label())
    }

    /// Keep only matching groups, preserving order
    pub fn apply(&self, groups: Vec<DependencyGroup>) -> Vec<DependencyGroup> {
        groups.into_iter().filter(|g| self.matches(g)).collect()
    }
}
