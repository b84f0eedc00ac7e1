//! Repin orchestrator for coordinating the entire update workflow
//!
//! This module provides:
//! - Workflow coordination: check uv, read, filter, look up, plan, add, lock
//! - Dry-run mode support
//! - Hand-off to the conflict resolver when `uv add` reports a workspace conflict
//! - Error handling with partial continuation across groups

use crate::config::{RepinConfig, VersionSource};
use crate::conflict::{
    parse_workspace_conflicts, surface, ConflictResolver, Prompter, ResolutionOutcome,
    StdinPrompter,
};
use crate::domain::DependencyGroup;
use crate::error::AppError;
use crate::manifest::{PyprojectManifest, WorkspaceMembers, PYPROJECT};
use crate::output::{create_formatter, OutputFormat};
use crate::package_manager::{ensure_available, AddCommand, CommandRunner, SystemRunner, UvCommand};
use crate::progress::Progress;
use crate::registry::{HttpClient, OutdatedReportOracle, PyPIAdapter, VersionOracle};
use crate::update::{pinned_names, plan_updates, UpdatePlan};
use std::io::Write;
use std::sync::Arc;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Manifests updated and locked
    Updated,
    /// Plan printed, nothing changed
    DryRun,
    /// Nothing needed changing
    NothingToDo,
    /// A workspace conflict was resolved by aligning members
    Resolved,
    /// The user declined conflict alignment
    Declined,
    /// A step failed with the given exit code
    Failed { code: i32 },
}

impl RunStatus {
    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Failed { code } if *code != 0 => *code,
            RunStatus::Failed { .. } => 1,
            _ => 0,
        }
    }

    /// Returns true for every non-failure outcome
    pub fn is_success(&self) -> bool {
        !matches!(self, RunStatus::Failed { .. })
    }
}

/// Orchestrator for coordinating the repin workflow
pub struct Orchestrator {
    config: RepinConfig,
    runner: Arc<dyn CommandRunner>,
    oracle: Arc<dyn VersionOracle>,
    prompter: Box<dyn Prompter>,
}

impl Orchestrator {
    /// Create an orchestrator with explicit collaborators
    pub fn new(
        config: RepinConfig,
        runner: Arc<dyn CommandRunner>,
        oracle: Arc<dyn VersionOracle>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            config,
            runner,
            oracle,
            prompter,
        }
    }

    /// Create an orchestrator running the real uv and querying the configured source
    pub fn from_config(config: RepinConfig) -> Result<Self, AppError> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(
            config.uv_program.clone(),
            config.project_dir.clone(),
        ));

        let oracle: Arc<dyn VersionOracle> = match config.source {
            VersionSource::PyPI => {
                let mut adapter =
                    PyPIAdapter::new(HttpClient::new()?).with_prerelease(config.prerelease);
                if let Some(url) = &config.pypi_url {
                    adapter = adapter.with_base_url(url.as_str());
                }
                Arc::new(adapter)
            }
            VersionSource::Outdated => Arc::new(OutdatedReportOracle::new(
                Arc::clone(&runner),
                config.prerelease,
            )),
        };

        Ok(Self::new(config, runner, oracle, Box::new(StdinPrompter)))
    }

    /// Run the repin workflow
    ///
    /// Progress and results go to `out`, diagnostics of failed commands to `err`.
    pub async fn run(&self, out: &mut dyn Write, err: &mut dyn Write) -> Result<RunStatus, AppError> {
        ensure_available(self.runner.as_ref())?;

        // Step 1: Read the root manifest and workspace layout
        let manifest_path = self.config.project_dir.join(PYPROJECT);
        let manifest = PyprojectManifest::load(&manifest_path)?;
        let workspace = WorkspaceMembers::discover(&self.config.project_dir, &manifest);

        // Step 2: Collect and filter groups
        let groups = manifest.direct_groups();
        if groups.is_empty() {
            return self.nothing(out, "No direct dependencies found.");
        }
        let groups = self.config.groups.apply(groups);
        if groups.is_empty() {
            return self.nothing(out, "No matching groups after --only-groups.");
        }
        let names = pinned_names(&groups);
        if names.is_empty() {
            return self.nothing(
                out,
                "No pinned dependencies (==version) found. Nothing to update.",
            );
        }

        // Step 3: Look up latest versions
        let plan = match self.lookup_and_plan(&groups, &names, out, err).await? {
            Some(plan) => plan,
            None => return Ok(RunStatus::Failed { code: 1 }),
        };

        // Step 4: Report or apply
        if self.config.dry_run {
            create_formatter(&self.config.output).format_plan(&plan, out)?;
            return Ok(RunStatus::DryRun);
        }
        if plan.is_empty() {
            return self.nothing(
                out,
                "All pinned dependencies are already at their latest versions. Nothing to do.",
            );
        }

        self.apply(&plan, &workspace, out, err).await
    }

    async fn lookup_and_plan(
        &self,
        groups: &[DependencyGroup],
        names: &[String],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Option<UpdatePlan>, AppError> {
        self.note(
            out,
            &format!(
                "Querying {} for latest versions of {} packages...",
                self.oracle.source_name(),
                names.len()
            ),
        )?;

        let mut progress = Progress::new(self.config.output.show_notes());
        progress.spinner("Resolving latest versions...");
        let latest = self.oracle.latest_versions(names).await;
        progress.finish_and_clear();
        tracing::debug!(requested = names.len(), resolved = latest.len(), "latest versions");

        if latest.is_empty() && self.config.source == VersionSource::PyPI {
            writeln!(
                err,
                "Failed to query PyPI for any packages. Check your network connection."
            )?;
            return Ok(None);
        }

        Ok(Some(plan_updates(groups, &latest)))
    }

    async fn apply(
        &self,
        plan: &UpdatePlan,
        workspace: &WorkspaceMembers,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<RunStatus, AppError> {
        let mut first_failure: Option<i32> = None;

        for (site, specs) in plan.batches() {
            let command = UvCommand::Add(
                AddCommand::frozen(site.clone(), specs)
                    .with_sources(self.config.prerelease, &self.config.indexes),
            );
            let output = self.run_command(&command, out)?;
            if output.success() {
                continue;
            }

            let diagnostic = format!("{}\n{}", output.stderr, output.stdout);
            match parse_workspace_conflicts(&diagnostic) {
                Some(conflicts) if !conflicts.is_empty() => {
                    tracing::debug!(site = %site.label(), conflicts = conflicts.len(), "workspace conflict");
                    return self.resolve(conflicts, workspace, out, err).await;
                }
                _ => {
                    tracing::warn!(site = %site.label(), code = output.exit_code(), "uv add failed");
                    writeln!(err, "Failed to update {}", site.describe())?;
                    surface(&output, err)?;
                    first_failure.get_or_insert(output.exit_code());
                }
            }
        }

        if let Some(code) = first_failure {
            writeln!(err, "One or more uv add commands failed. See output above.")?;
            return Ok(RunStatus::Failed { code });
        }

        let output = self.run_command(&UvCommand::Lock, out)?;
        if !output.success() {
            writeln!(
                err,
                "uv lock failed. pyproject.toml files have been updated but lock failed."
            )?;
            surface(&output, err)?;
            return Ok(RunStatus::Failed {
                code: output.exit_code(),
            });
        }

        if self.config.sync {
            let output = self.run_command(
                &UvCommand::Sync {
                    extras: self.config.sync_extras.clone(),
                },
                out,
            )?;
            if !output.success() {
                writeln!(err, "uv sync failed. Lock succeeded but environment not synced.")?;
                surface(&output, err)?;
                return Ok(RunStatus::Failed {
                    code: output.exit_code(),
                });
            }
        }

        let tail = if self.config.sync {
            " and environment synced."
        } else {
            " (run `uv sync` to update environment)."
        };
        self.note(out, &format!("\nDone. pyproject.toml updated{}", tail))?;
        Ok(RunStatus::Updated)
    }

    async fn resolve(
        &self,
        conflicts: Vec<crate::domain::WorkspaceConflict>,
        workspace: &WorkspaceMembers,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<RunStatus, AppError> {
        let options = self.config.resolver_options();
        let resolver = ConflictResolver::new(
            self.runner.as_ref(),
            self.oracle.as_ref(),
            self.prompter.as_ref(),
            workspace,
            &options,
        );

        Ok(match resolver.resolve(conflicts, out, err).await? {
            ResolutionOutcome::Resolved => RunStatus::Resolved,
            ResolutionOutcome::Declined => RunStatus::Declined,
            ResolutionOutcome::Failed(failure) => {
                writeln!(err, "Conflict resolution failed: {}", failure)?;
                RunStatus::Failed {
                    code: failure.exit_code(),
                }
            }
        })
    }

    fn run_command(
        &self,
        command: &UvCommand,
        out: &mut dyn Write,
    ) -> Result<crate::package_manager::CommandOutput, AppError> {
        self.note(
            out,
            &format!("Running: {}", command.display(self.runner.program())),
        )?;
        Ok(self.runner.run(command)?)
    }

    /// Early exit with nothing to change
    ///
    /// A JSON dry run still emits an (empty) plan so stdout stays parseable.
    fn nothing(&self, out: &mut dyn Write, message: &str) -> Result<RunStatus, AppError> {
        if self.config.dry_run && self.config.output.format == OutputFormat::Json {
            create_formatter(&self.config.output).format_plan(&UpdatePlan::default(), out)?;
        } else {
            self.note(out, message)?;
        }
        Ok(RunStatus::NothingToDo)
    }

    fn note(&self, out: &mut dyn Write, message: &str) -> std::io::Result<()> {
        if self.config.output.show_notes() {
            writeln!(out, "{}", message)?;
        }
        Ok(())
    }
}
