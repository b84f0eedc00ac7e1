//! Core domain models for uvrepin
//!
//! This module contains the fundamental types used throughout the application:
//! - Requirement lines and package name normalization
//! - Dependency groups and declaration sites
//! - Workspace conflicts and their resolution plans

mod conflict;
mod group;
mod requirement;

pub use conflict::{ConflictResolution, WorkspaceConflict};
pub use group::{DeclarationSite, DependencyGroup};
pub use requirement::{normalize_name, parse_requirement, ParsedRequirement, Requirement};
