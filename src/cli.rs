//! CLI argument parsing module for uvrepin

use crate::config::VersionSource;
use crate::conflict::TargetPolicy;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Repin pyproject.toml direct dependencies to their latest exact versions
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uvrepin",
    version,
    about = "Repin pyproject.toml direct dependencies to their latest exact versions using uv"
)]
pub struct CliArgs {
    /// Project directory containing pyproject.toml (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // General options
    /// Dry run mode - show what would be updated without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run `uv sync` after locking
    #[arg(long)]
    pub sync: bool,

    /// Extra to include when syncing (can be specified multiple times, implies --sync)
    #[arg(long, value_name = "NAME", action = ArgAction::Append)]
    pub sync_extra: Vec<String>,

    // Group filters
    /// Comma separated groups to update (`main` for [project] dependencies)
    #[arg(long, value_name = "LIST")]
    pub only_groups: Option<String>,

    // Resolution sources
    /// Allow pre-release versions
    #[arg(long)]
    pub pre: bool,

    /// Additional package index passed to `uv add` (can be specified multiple times)
    #[arg(long, value_name = "URL", action = ArgAction::Append)]
    pub index: Vec<String>,

    // Conflict handling
    /// Accept workspace conflict alignment without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// How the aligned version is chosen on workspace conflicts (latest, max)
    #[arg(long, default_value = "latest", value_parser = TargetPolicy::parse)]
    pub policy: TargetPolicy,

    /// Where latest versions come from (pypi, outdated)
    #[arg(long, default_value = "pypi", value_parser = VersionSource::parse)]
    pub source: VersionSource,

    /// uv executable to invoke
    #[arg(long, value_name = "PROGRAM", env = "UVREPIN_UV", default_value = "uv")]
    pub uv: String,

    /// Base URL of the PyPI JSON API
    #[arg(long, value_name = "URL", env = "UVREPIN_PYPI_URL")]
    pub pypi_url: Option<String>,

    // Output options
    /// Output the dry-run plan in JSON format
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["uvrepin"]);
        assert_eq!(args.path, PathBuf::from("."));
        assert!(!args.dry_run);
        assert!(!args.sync);
        assert!(args.sync_extra.is_empty());
        assert!(args.only_groups.is_none());
        assert!(!args.pre);
        assert!(args.index.is_empty());
        assert!(!args.yes);
        assert_eq!(args.policy, TargetPolicy::Latest);
        assert_eq!(args.source, VersionSource::PyPI);
        assert!(!args.json);
        assert!(!args.no_color);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_path_argument() {
        let args = CliArgs::parse_from(["uvrepin", "/some/path"]);
        assert_eq!(args.path, PathBuf::from("/some/path"));
    }

    #[test]
    fn test_dry_run_flags() {
        assert!(CliArgs::parse_from(["uvrepin", "-n"]).dry_run);
        assert!(CliArgs::parse_from(["uvrepin", "--dry-run"]).dry_run);
    }

    #[test]
    fn test_sync_extra_multiple() {
        let args = CliArgs::parse_from(["uvrepin", "--sync-extra", "dev", "--sync-extra", "docs"]);
        assert_eq!(args.sync_extra, vec!["dev", "docs"]);
    }

    #[test]
    fn test_index_multiple() {
        let args = CliArgs::parse_from([
            "uvrepin",
            "--index",
            "https://a.example/simple",
            "--index",
            "https://b.example/simple",
        ]);
        assert_eq!(
            args.index,
            vec!["https://a.example/simple", "https://b.example/simple"]
        );
    }

    #[test]
    fn test_only_groups() {
        let args = CliArgs::parse_from(["uvrepin", "--only-groups", "main,dev"]);
        assert_eq!(args.only_groups.as_deref(), Some("main,dev"));
    }

    #[test]
    fn test_policy_values() {
        let args = CliArgs::parse_from(["uvrepin", "--policy", "max"]);
        assert_eq!(args.policy, TargetPolicy::Max);
        assert!(CliArgs::try_parse_from(["uvrepin", "--policy", "newest"]).is_err());
    }

    #[test]
    fn test_source_values() {
        let args = CliArgs::parse_from(["uvrepin", "--source", "outdated"]);
        assert_eq!(args.source, VersionSource::Outdated);
        assert!(CliArgs::try_parse_from(["uvrepin", "--source", "conda"]).is_err());
    }

    #[test]
    fn test_yes_and_quiet_short_flags() {
        let args = CliArgs::parse_from(["uvrepin", "-y", "-q"]);
        assert!(args.yes);
        assert!(args.quiet);
    }

    #[test]
    fn test_uv_program() {
        let args = CliArgs::parse_from(["uvrepin", "--uv", "/opt/uv/bin/uv"]);
        assert_eq!(args.uv, "/opt/uv/bin/uv");
    }

    #[test]
    fn test_combined_flags() {
        let args = CliArgs::parse_from([
            "uvrepin",
            "/path/to/project",
            "-n",
            "--verbose",
            "--pre",
            "--only-groups",
            "dev",
            "--json",
            "--no-color",
        ]);
        assert_eq!(args.path, PathBuf::from("/path/to/project"));
        assert!(args.dry_run);
        assert!(args.verbose);
        assert!(args.pre);
        assert_eq!(args.only_groups.as_deref(), Some("dev"));
        assert!(args.json);
        assert!(args.no_color);
    }
}
