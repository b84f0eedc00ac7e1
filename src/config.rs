//! Run configuration assembled from CLI arguments and the environment

use crate::cli::CliArgs;
use crate::conflict::{is_ci_value, ResolverOptions, TargetPolicy};
use crate::error::ConfigError;
use crate::output::OutputConfig;
use crate::update::GroupFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where latest versions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSource {
    /// PyPI JSON API
    #[default]
    PyPI,
    /// `uv pip list --outdated` in the project environment
    Outdated,
}

impl VersionSource {
    /// Parse a source name (case-insensitive)
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pypi" => Ok(VersionSource::PyPI),
            "outdated" => Ok(VersionSource::Outdated),
            _ => Err(ConfigError::UnknownVersionSource {
                value: value.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSource::PyPI => "pypi",
            VersionSource::Outdated => "outdated",
        }
    }
}

impl FromStr for VersionSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run needs to know
#[derive(Debug, Clone)]
pub struct RepinConfig {
    /// Directory containing the root `pyproject.toml`
    pub project_dir: PathBuf,
    pub dry_run: bool,
    /// `--only-groups` selection
    pub groups: GroupFilter,
    /// Run `uv sync` after locking
    pub sync: bool,
    /// Extras passed to `uv sync`
    pub sync_extras: Vec<String>,
    /// Allow pre-releases when looking up and adding
    pub prerelease: bool,
    /// Extra indexes passed to `uv add`
    pub indexes: Vec<String>,
    /// Accept conflict alignment without prompting
    pub auto_accept: bool,
    /// Conflict target policy
    pub policy: TargetPolicy,
    pub source: VersionSource,
    /// Package manager executable
    pub uv_program: String,
    /// Override for the PyPI JSON API base URL
    pub pypi_url: Option<String>,
    pub output: OutputConfig,
}

impl Default for RepinConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            dry_run: false,
            groups: GroupFilter::new(),
            sync: false,
            sync_extras: Vec::new(),
            prerelease: false,
            indexes: Vec::new(),
            auto_accept: false,
            policy: TargetPolicy::default(),
            source: VersionSource::default(),
            uv_program: "uv".to_string(),
            pypi_url: None,
            output: OutputConfig::default(),
        }
    }
}

impl RepinConfig {
    /// Build the configuration from parsed arguments and the `CI` variable
    pub fn from_args(args: &CliArgs, ci: Option<&str>) -> Result<Self, ConfigError> {
        if args.quiet && args.verbose {
            return Err(ConfigError::ConflictingOptions {
                message: "--quiet and --verbose cannot be used together".to_string(),
            });
        }

        let groups = match &args.only_groups {
            Some(list) => GroupFilter::parse(list),
            None => GroupFilter::new(),
        };

        Ok(Self {
            project_dir: args.path.clone(),
            dry_run: args.dry_run,
            groups,
            sync: args.sync || !args.sync_extra.is_empty(),
            sync_extras: args.sync_extra.clone(),
            prerelease: args.pre,
            indexes: args.index.clone(),
            auto_accept: args.yes || is_ci_value(ci),
            policy: args.policy,
            source: args.source,
            uv_program: args.uv.clone(),
            pypi_url: args.pypi_url.clone(),
            output: OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.no_color),
        })
    }

    /// Options handed to the conflict resolver
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            policy: self.policy,
            auto_accept: self.auto_accept,
            sync: self.sync,
            sync_extras: self.sync_extras.clone(),
            prerelease: self.prerelease,
            indexes: self.indexes.clone(),
        }
    }
}
