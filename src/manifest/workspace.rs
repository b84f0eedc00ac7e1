//! Workspace member layout
//!
//! Maps each member's normalized project name to its directory relative to the
//! workspace root. Conflict diagnostics name members by project name, while
//! `uv add --project` and the manifest re-read need the directory.

use super::pyproject_toml::{PyprojectManifest, PYPROJECT};
use crate::domain::normalize_name;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Members of a uv workspace
#[derive(Debug, Clone, Default)]
pub struct WorkspaceMembers {
    root: PathBuf,
    dirs: BTreeMap<String, PathBuf>,
}

impl WorkspaceMembers {
    /// Discover members declared by the root manifest
    ///
    /// Globs in `tool.uv.workspace.members` are expanded relative to `root`,
    /// entries matched by `exclude` or lacking a readable manifest with a
    /// project name are skipped. The root project itself maps to `.`.
    pub fn discover(root: &Path, manifest: &PyprojectManifest) -> Self {
        let mut dirs = BTreeMap::new();
        if let Some(name) = manifest.project_name() {
            dirs.insert(normalize_name(name), PathBuf::from("."));
        }

        let (members, exclude) = manifest.workspace_patterns();
        let excluded: Vec<glob::Pattern> = exclude
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    tracing::debug!(pattern = %p, %err, "invalid workspace exclude pattern");
                    None
                }
            })
            .collect();

        for pattern in &members {
            let full = root.join(pattern);
            let Some(full) = full.to_str() else {
                continue;
            };
            let paths = match glob::glob(full) {
                Ok(paths) => paths,
                Err(err) => {
                    tracing::debug!(pattern = %pattern, %err, "invalid workspace member pattern");
                    continue;
                }
            };

            for dir in paths.flatten().filter(|p| p.is_dir()) {
                let Ok(relative) = dir.strip_prefix(root) else {
                    continue;
                };
                if excluded.iter().any(|p| p.matches_path(relative)) {
                    tracing::debug!(member = %relative.display(), "excluded workspace member");
                    continue;
                }
                match PyprojectManifest::load(dir.join(PYPROJECT)) {
                    Ok(member) => {
                        if let Some(name) = member.project_name() {
                            dirs.insert(normalize_name(name), relative.to_path_buf());
                        }
                    }
                    Err(err) => {
                        tracing::debug!(member = %relative.display(), %err, "skipping workspace member");
                    }
                }
            }
        }

        tracing::debug!(members = dirs.len(), "discovered workspace members");
        Self {
            root: root.to_path_buf(),
            dirs,
        }
    }

    /// Directory of a member relative to the root
    ///
    /// Unknown members fall back to a directory of the same name.
    pub fn dir_for(&self, member: &str) -> PathBuf {
        self.dirs
            .get(&normalize_name(member))
            .cloned()
            .unwrap_or_else(|| PathBuf::from(member))
    }

    /// Path of a member's manifest
    pub fn manifest_path(&self, member: &str) -> PathBuf {
        self.root.join(self.dir_for(member)).join(PYPROJECT)
    }

    /// Number of known members, the root project included
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    /// Returns true if no member was discovered
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
