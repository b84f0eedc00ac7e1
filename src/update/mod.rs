//! Update planning
//!
//! This module provides:
//! - Group filter configuration from CLI args
//! - Version string helpers
//! - The planner that decides which pins move to which version

mod filter;
mod version_info;

pub use filter::GroupFilter;
pub use version_info::{compare_versions, is_prerelease_version};

use crate::domain::{DeclarationSite, DependencyGroup, Requirement};
use serde::Serialize;
use std::collections::HashMap;

/// One pin that will move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedUpdate {
    /// Where the requirement is declared
    pub site: DeclarationSite,
    /// The requirement as currently pinned
    pub requirement: Requirement,
    /// Version it moves to
    pub latest: String,
}

impl PlannedUpdate {
    /// Currently pinned version
    pub fn current(&self) -> &str {
        self.requirement.pinned.as_deref().unwrap_or_default()
    }

    /// Specifier passed to `uv add`
    pub fn spec(&self) -> String {
        self.requirement.pin_spec(&self.latest)
    }
}

/// Ordered list of planned updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatePlan {
    entries: Vec<PlannedUpdate>,
}

impl UpdatePlan {
    /// Updates in group order, then record order
    pub fn entries(&self) -> &[PlannedUpdate] {
        &self.entries
    }

    /// Returns true if nothing would change
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of planned updates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Specifiers grouped per declaration site, in first-seen order
    pub fn batches(&self) -> Vec<(DeclarationSite, Vec<String>)> {
        let mut batches: Vec<(DeclarationSite, Vec<String>)> = Vec::new();
        for entry in &self.entries {
            match batches.iter_mut().find(|(site, _)| *site == entry.site) {
                Some((_, specs)) => specs.push(entry.spec()),
                None => batches.push((entry.site.clone(), vec![entry.spec()])),
            }
        }
        batches
    }
}

/// Plan which pinned requirements move to their latest version
///
/// A requirement is included when `latest` has an entry for its normalized
/// name that differs from the current pin.
pub fn plan_updates(groups: &[DependencyGroup], latest: &HashMap<String, String>) -> UpdatePlan {
    let entries = groups
        .iter()
        .flat_map(|group| {
            group.pinned().filter_map(|req| {
                let new_version = latest.get(&req.normalized_name())?;
                let current = req.pinned.as_deref()?;
                if compare_versions(new_version, current) == std::cmp::Ordering::Less {
                    tracing::debug!(package = %req.name, current, latest = %new_version, "latest is older than the pin");
                }
                (current != new_version.as_str()).then(|| PlannedUpdate {
                    site: group.site.clone(),
                    requirement: req.clone(),
                    latest: new_version.clone(),
                })
            })
        })
        .collect();
    UpdatePlan { entries }
}

/// Names of pinned requirements, deduplicated by normalized name
pub fn pinned_names(groups: &[DependencyGroup]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    groups
        .iter()
        .flat_map(DependencyGroup::pinned)
        .filter(|req| seen.insert(req.normalized_name()))
        .map(|req| req.name.clone())
        .collect()
}
