//! Workspace conflict detection and resolution
//!
//! This module provides:
//! - Diagnostic classifiers that turn uv's prose into conflict records
//! - The resolver that aligns members, relocks and optionally syncs

mod parser;
mod resolver;

pub use parser::{
    classifiers, parse_workspace_conflicts, DiagnosticClassifier, IncompatibleClauseClassifier,
    PairedExtrasClassifier, PinClaim, NO_SOLUTION_MARKER,
};
pub use resolver::{
    determine_target_versions, is_ci_value, ConflictResolver, Phase, Prompter,
    ResolutionFailure, ResolutionOutcome, ResolverOptions, StdinPrompter, TargetPolicy,
};

pub(crate) use resolver::surface;

#[cfg(test)]
pub(crate) use resolver::test_support;
