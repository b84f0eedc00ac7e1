//! Dependency groups and where a dependency is declared

use super::Requirement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a dependency lives in a manifest
///
/// Decides the shape of the `uv add` call that rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum DeclarationSite {
    /// `[project] dependencies`
    Main,
    /// `[project.optional-dependencies] <extra>`
    Optional(String),
    /// `[dependency-groups] <group>`
    Group(String),
}

impl DeclarationSite {
    /// Label used in reports and the `--only-groups` filter
    pub fn label(&self) -> &str {
        match self {
            DeclarationSite::Main => "main",
            DeclarationSite::Optional(name) | DeclarationSite::Group(name) => name,
        }
    }

    /// Human readable description, e.g. `optional extra 'dev'`
    pub fn describe(&self) -> String {
        match self {
            DeclarationSite::Main => "main dependencies".to_string(),
            DeclarationSite::Optional(name) => format!("optional extra '{}'", name),
            DeclarationSite::Group(name) => format!("dependency group '{}'", name),
        }
    }
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A collection of direct dependencies declared together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    /// Where the group is declared
    pub site: DeclarationSite,
    /// Parsed requirements in manifest order
    pub requirements: Vec<Requirement>,
}

impl DependencyGroup {
    /// Creates a new group
    pub fn new(site: DeclarationSite, requirements: Vec<Requirement>) -> Self {
        Self { site, requirements }
    }

    /// Label used in reports
    pub fn label(&self) -> &str {
        self.site.label()
    }

    /// Requirements that carry an exact pin
    pub fn pinned(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.is_pinned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{parse_requirement, ParsedRequirement};

    fn req(line: &str) -> Requirement {
        match parse_requirement(line) {
            Some(ParsedRequirement::Requirement(r)) => r,
            _ => panic!("bad fixture {line}"),
        }
    }

    #[test]
    fn test_site_labels() {
        assert_eq!(DeclarationSite::Main.label(), "main");
        assert_eq!(DeclarationSite::Optional("dev".into()).label(), "dev");
        assert_eq!(DeclarationSite::Group("lint".into()).to_string(), "lint");
    }

    #[test]
    fn test_site_describe() {
        assert_eq!(DeclarationSite::Main.describe(), "main dependencies");
        assert_eq!(
            DeclarationSite::Optional("dev".into()).describe(),
            "optional extra 'dev'"
        );
        assert_eq!(
            DeclarationSite::Group("lint".into()).describe(),
            "dependency group 'lint'"
        );
    }

    #[test]
    fn test_site_ordering_main_first() {
        let mut sites = vec![
            DeclarationSite::Group("a".into()),
            DeclarationSite::Optional("z".into()),
            DeclarationSite::Main,
            DeclarationSite::Optional("b".into()),
        ];
        sites.sort();
        assert_eq!(
            sites,
            vec![
                DeclarationSite::Main,
                DeclarationSite::Optional("b".into()),
                DeclarationSite::Optional("z".into()),
                DeclarationSite::Group("a".into()),
            ]
        );
    }

    #[test]
    fn test_group_pinned() {
        let group = DependencyGroup::new(
            DeclarationSite::Main,
            vec![req("requests==2.28.0"), req("httpx>=0.24"), req("Typing_Extensions==4.7.1")],
        );
        let pinned: Vec<_> = group.pinned().map(|r| r.name.as_str()).collect();
        assert_eq!(pinned, vec!["requests", "Typing_Extensions"]);
        assert_eq!(group.label(), "main");
    }
}
