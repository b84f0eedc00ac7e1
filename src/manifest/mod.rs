//! Manifest reading
//!
//! This module provides functionality to:
//! - Parse direct dependency groups from pyproject.toml
//! - Locate where a package is declared in a member manifest
//! - Discover uv workspace members and their directories

mod pyproject_toml;
mod workspace;

pub use pyproject_toml::{locate_declaration, PyprojectManifest, PYPROJECT};
pub use workspace::WorkspaceMembers;
