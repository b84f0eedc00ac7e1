//! uvrepin - repin direct dependencies of a uv project
//!
//! This library provides the core functionality for moving every exact pin
//! (`name==version`) in a `pyproject.toml` to the latest release:
//! - Requirement parsing and dependency group discovery
//! - Latest version lookup (PyPI JSON API or `uv pip list --outdated`)
//! - Batched `uv add --frozen` updates followed by `uv lock`
//! - Workspace conflict detection and member alignment

pub mod cli;
pub mod config;
pub mod conflict;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod registry;
pub mod update;
