//! pyproject.toml reader
//!
//! Handles:
//! - project.dependencies (PEP 621)
//! - project.optional-dependencies (PEP 621)
//! - dependency-groups (PEP 735)
//! - tool.uv.workspace members/exclude

use crate::domain::{
    normalize_name, parse_requirement, DeclarationSite, DependencyGroup, ParsedRequirement,
    Requirement,
};
use crate::error::ManifestError;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Manifest file name
pub const PYPROJECT: &str = "pyproject.toml";

/// A loaded pyproject.toml
#[derive(Debug, Clone)]
pub struct PyprojectManifest {
    path: PathBuf,
    document: Table,
}

impl PyprojectManifest {
    /// Read and parse a manifest from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ManifestError::not_found(path));
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))?;
        Self::parse(path, &content)
    }

    /// Parse manifest content, `path` is only used for error reporting
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, ManifestError> {
        let path = path.into();
        let document: Table = toml::from_str(content)
            .map_err(|e: toml::de::Error| ManifestError::toml_parse_error(&path, e.to_string()))?;
        Ok(Self { path, document })
    }

    /// Path the manifest was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `project.name`, if declared
    pub fn project_name(&self) -> Option<&str> {
        self.project()?.get("name")?.as_str()
    }

    /// Direct dependency groups in manifest order
    ///
    /// Main dependencies come first, then optional extras, then dependency
    /// groups. Groups without any named requirement are omitted.
    pub fn direct_groups(&self) -> Vec<DependencyGroup> {
        self.sections()
            .into_iter()
            .filter_map(|(site, entries)| {
                let requirements: Vec<Requirement> =
                    entries.iter().filter_map(named_requirement).collect();
                (!requirements.is_empty()).then(|| DependencyGroup::new(site, requirements))
            })
            .collect()
    }

    /// Find where a package is declared, searching main, optional, then groups
    pub fn locate(&self, package: &str) -> Option<DeclarationSite> {
        let wanted = normalize_name(package);
        self.sections().into_iter().find_map(|(site, entries)| {
            entries
                .iter()
                .filter_map(named_requirement)
                .any(|r| r.normalized_name() == wanted)
                .then_some(site)
        })
    }

    /// Workspace member patterns and exclusions from `tool.uv.workspace`
    pub fn workspace_patterns(&self) -> (Vec<String>, Vec<String>) {
        let workspace = self
            .document
            .get("tool")
            .and_then(|t| t.get("uv"))
            .and_then(|u| u.get("workspace"));
        let strings = |key: &str| -> Vec<String> {
            workspace
                .and_then(|w| w.get(key))
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        (strings("members"), strings("exclude"))
    }

    fn project(&self) -> Option<&Table> {
        self.document.get("project")?.as_table()
    }

    /// Every requirement list with its declaration site, in search order
    fn sections(&self) -> Vec<(DeclarationSite, &[Value])> {
        let mut sections = Vec::new();

        if let Some(deps) = self
            .project()
            .and_then(|p| p.get("dependencies"))
            .and_then(Value::as_array)
        {
            sections.push((DeclarationSite::Main, deps.as_slice()));
        }

        if let Some(optional) = self
            .project()
            .and_then(|p| p.get("optional-dependencies"))
            .and_then(Value::as_table)
        {
            for (extra, deps) in optional {
                if let Some(deps) = deps.as_array() {
                    sections.push((DeclarationSite::Optional(extra.clone()), deps.as_slice()));
                }
            }
        }

        if let Some(groups) = self
            .document
            .get("dependency-groups")
            .and_then(Value::as_table)
        {
            for (group, deps) in groups {
                // Non-string entries such as `{ include-group = "..." }` are ignored
                if let Some(deps) = deps.as_array() {
                    sections.push((DeclarationSite::Group(group.clone()), deps.as_slice()));
                }
            }
        }

        sections
    }
}

fn named_requirement(value: &Value) -> Option<Requirement> {
    match parse_requirement(value.as_str()?)? {
        ParsedRequirement::Requirement(req) => Some(req),
        ParsedRequirement::Skip => None,
    }
}

/// Locate a package in the manifest at `path`, reading it fresh
///
/// A missing or unreadable manifest, or a package declared nowhere, counts as
/// a main dependency.
pub fn locate_declaration(path: &Path, package: &str) -> DeclarationSite {
    match PyprojectManifest::load(path) {
        Ok(manifest) => manifest.locate(package).unwrap_or_else(|| {
            tracing::debug!(package, path = %path.display(), "package not declared, assuming main");
            DeclarationSite::Main
        }),
        Err(err) => {
            tracing::debug!(%err, package, "member manifest unavailable, assuming main");
            DeclarationSite::Main
        }
    }
}
