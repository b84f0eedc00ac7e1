//! Workspace conflict resolution
//!
//! Drives one recovery episode after `uv add` reported incompatible pins:
//!
//! ```text
//! CONFLICT_DETECTED -> TARGETS_DETERMINED -> AUTO_ACCEPTED | USER_PROMPTED
//!   -> ALIGNING -> LOCKING -> [SYNCING] -> SUCCESS
//!   -> DECLINED
//!   -> FAILED
//! ```
//!
//! Member manifests edited during ALIGNING are never rolled back.

use crate::domain::{ConflictResolution, DeclarationSite, WorkspaceConflict};
use crate::error::{AppError, ConfigError};
use crate::manifest::{locate_declaration, WorkspaceMembers};
use crate::package_manager::{AddCommand, CommandOutput, CommandRunner, UvCommand};
use crate::registry::VersionOracle;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// How the aligned version of a conflicting package is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Latest version from the oracle, else the largest existing pin
    #[default]
    Latest,
    /// Largest existing pin (lexicographic)
    Max,
}

impl TargetPolicy {
    /// Parse a policy name
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(TargetPolicy::Latest),
            "max" => Ok(TargetPolicy::Max),
            _ => Err(ConfigError::UnknownPolicy {
                value: value.to_string(),
            }),
        }
    }

    /// Policy name as accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPolicy::Latest => "latest",
            TargetPolicy::Max => "max",
        }
    }
}

impl FromStr for TargetPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution phases, reported through tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ConflictDetected,
    TargetsDetermined,
    AutoAccepted,
    UserPrompted,
    Aligning,
    Locking,
    Syncing,
    Success,
    Declined,
    Failed,
}

/// Returns true for the `CI` values that enable auto-accept
pub fn is_ci_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Choose one target version per conflicting package
pub async fn determine_target_versions(
    conflicts: &[WorkspaceConflict],
    policy: TargetPolicy,
    oracle: &dyn VersionOracle,
) -> BTreeMap<String, String> {
    let mut targets = BTreeMap::new();
    for conflict in conflicts {
        if targets.contains_key(conflict.package_name()) {
            continue;
        }
        let target = match policy {
            TargetPolicy::Max => conflict.max_pin().to_string(),
            TargetPolicy::Latest => match oracle.latest_version(conflict.package_name()).await {
                Some(latest) => latest,
                None => {
                    tracing::debug!(
                        package = conflict.package_name(),
                        "no latest version, falling back to largest pin"
                    );
                    conflict.max_pin().to_string()
                }
            },
        };
        targets.insert(conflict.package_name().to_string(), target);
    }
    targets
}

/// Source of the yes/no answer to the alignment prompt
pub trait Prompter: Send + Sync {
    /// Read one answer line
    fn answer(&self) -> io::Result<String>;
}

/// Reads the answer from standard input
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn answer(&self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Knobs for one resolution episode
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    pub policy: TargetPolicy,
    /// Skip the prompt (`--yes` or CI)
    pub auto_accept: bool,
    /// Run `uv sync` after a successful lock
    pub sync: bool,
    /// Extras passed to `uv sync`
    pub sync_extras: Vec<String>,
    /// Pass `--prerelease allow` to `uv add`
    pub prerelease: bool,
    /// Extra indexes passed to `uv add`
    pub indexes: Vec<String>,
}

/// Why a resolution episode failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// Conflicts could not be turned into a plan
    NoPlan,
    /// `uv add` failed for a member
    Align {
        member: String,
        site: DeclarationSite,
        code: i32,
    },
    /// `uv lock` failed after manifests were edited
    Lock { code: i32 },
    /// `uv sync` failed after a successful lock
    Sync { code: i32 },
}

impl ResolutionFailure {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolutionFailure::NoPlan => 1,
            ResolutionFailure::Align { code, .. }
            | ResolutionFailure::Lock { code }
            | ResolutionFailure::Sync { code } => *code,
        }
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionFailure::NoPlan => write!(f, "reported conflicts do not form one alignment plan"),
            ResolutionFailure::Align { member, site, .. } => {
                write!(f, "failed to align {} for member '{}'", site.describe(), member)
            }
            ResolutionFailure::Lock { .. } => {
                write!(f, "manifests were modified but the lock step failed")
            }
            ResolutionFailure::Sync { .. } => {
                write!(f, "lock succeeded but environment may be inconsistent")
            }
        }
    }
}

/// How a resolution episode ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Members aligned and the workspace locked
    Resolved,
    /// The user declined; manual commands were printed
    Declined,
    /// A step failed
    Failed(ResolutionFailure),
}

/// Resolves workspace conflicts by aligning every member on one version
pub struct ConflictResolver<'a> {
    runner: &'a dyn CommandRunner,
    oracle: &'a dyn VersionOracle,
    prompter: &'a dyn Prompter,
    workspace: &'a WorkspaceMembers,
    options: &'a ResolverOptions,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        oracle: &'a dyn VersionOracle,
        prompter: &'a dyn Prompter,
        workspace: &'a WorkspaceMembers,
        options: &'a ResolverOptions,
    ) -> Self {
        Self {
            runner,
            oracle,
            prompter,
            workspace,
            options,
        }
    }

    /// Run one resolution episode
    ///
    /// Progress goes to `out`, diagnostics of failed commands to `err`.
    pub async fn resolve(
        &self,
        conflicts: Vec<WorkspaceConflict>,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<ResolutionOutcome, AppError> {
        tracing::debug!(phase = ?Phase::ConflictDetected, conflicts = conflicts.len());

        let targets = determine_target_versions(&conflicts, self.options.policy, self.oracle).await;
        let Some(resolution) = ConflictResolution::new(conflicts, targets) else {
            tracing::warn!(phase = ?Phase::Failed, "conflicts produced no resolution plan");
            return Ok(ResolutionOutcome::Failed(ResolutionFailure::NoPlan));
        };
        tracing::debug!(phase = ?Phase::TargetsDetermined, targets = ?resolution.target_versions());

        self.print_summary(&resolution, out)?;

        if self.options.auto_accept {
            tracing::debug!(phase = ?Phase::AutoAccepted);
            writeln!(out, "Auto-accepting alignment to target versions.")?;
        } else {
            tracing::debug!(phase = ?Phase::UserPrompted);
            write!(
                out,
                "Align all pyproject.toml files to target versions ({}) and retry lock? [y/N] ",
                self.options.policy
            )?;
            out.flush()?;
            let answer = self.prompter.answer().unwrap_or_else(|e| {
                tracing::debug!(error = %e, "could not read answer");
                String::new()
            });
            if !is_yes(&answer) {
                tracing::debug!(phase = ?Phase::Declined);
                self.print_manual_help(&resolution, out)?;
                return Ok(ResolutionOutcome::Declined);
            }
        }

        let outcome = self.apply(&resolution, out, err)?;
        match &outcome {
            ResolutionOutcome::Resolved => {
                tracing::debug!(phase = ?Phase::Success);
                writeln!(out, "Workspace conflicts resolved successfully")?;
            }
            ResolutionOutcome::Failed(failure) => {
                tracing::warn!(phase = ?Phase::Failed, %failure);
            }
            ResolutionOutcome::Declined => {}
        }
        Ok(outcome)
    }

    fn print_summary(&self, resolution: &ConflictResolution, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "\nConflicts detected in extra \"{}\" across {} members:",
            resolution.extra_name(),
            resolution.affected_members().len()
        )?;
        for conflict in resolution.conflicts() {
            writeln!(
                out,
                "  {} → {}",
                conflict,
                resolution.target_for(conflict.package_name()).unwrap_or("unknown")
            )?;
        }
        Ok(())
    }

    fn print_manual_help(&self, resolution: &ConflictResolution, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "\nTo manually resolve these conflicts, align the versions in each member's pyproject.toml:"
        )?;
        writeln!(
            out,
            "\nSuggested commands to align extra '{}':",
            resolution.extra_name()
        )?;
        for member in resolution.affected_members() {
            let dir = self.workspace.dir_for(member);
            for (site, specs) in self.member_batches(resolution, member) {
                let command = UvCommand::Add(AddCommand::new(site, specs).with_project(dir.clone()));
                writeln!(out, "  {}", command.display(self.runner.program()))?;
            }
        }
        writeln!(out, "\nThen run: {} lock", self.runner.program())?;
        Ok(())
    }

    /// `name==target` specs for one member, keyed by where the member declares them
    ///
    /// Sites sort main first, then optional extras by name, then dependency groups by name.
    fn member_batches(
        &self,
        resolution: &ConflictResolution,
        member: &str,
    ) -> BTreeMap<DeclarationSite, Vec<String>> {
        let manifest = self.workspace.manifest_path(member);
        let mut batches: BTreeMap<DeclarationSite, Vec<String>> = BTreeMap::new();
        for conflict in resolution.conflicts_for(member) {
            let Some(target) = resolution.target_for(conflict.package_name()) else {
                continue;
            };
            let site = locate_declaration(&manifest, conflict.package_name());
            batches
                .entry(site)
                .or_default()
                .push(format!("{}=={}", conflict.package_name(), target));
        }
        batches
    }

    /// ALIGNING, LOCKING and SYNCING
    fn apply(
        &self,
        resolution: &ConflictResolution,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<ResolutionOutcome, AppError> {
        tracing::debug!(phase = ?Phase::Aligning, members = resolution.affected_members().len());
        writeln!(out, "\nAligning workspace members...")?;

        for member in resolution.affected_members() {
            let dir = self.workspace.dir_for(member);
            for (site, specs) in self.member_batches(resolution, member) {
                let command = UvCommand::Add(
                    AddCommand::frozen(site.clone(), specs)
                        .with_project(dir.clone())
                        .with_sources(self.options.prerelease, &self.options.indexes),
                );
                let output = self.run(&command, out)?;
                if !output.success() {
                    writeln!(
                        out,
                        "Failed to stage {} deps for member '{}'",
                        site_kind(&site),
                        member
                    )?;
                    surface(&output, err)?;
                    return Ok(ResolutionOutcome::Failed(ResolutionFailure::Align {
                        member: member.clone(),
                        site,
                        code: output.exit_code(),
                    }));
                }
            }
        }

        tracing::debug!(phase = ?Phase::Locking);
        let output = self.run(&UvCommand::Lock, out)?;
        if !output.success() {
            writeln!(out, "uv lock failed after alignment. Files have been modified.")?;
            surface(&output, err)?;
            return Ok(ResolutionOutcome::Failed(ResolutionFailure::Lock {
                code: output.exit_code(),
            }));
        }

        if self.options.sync {
            tracing::debug!(phase = ?Phase::Syncing);
            let output = self.run(
                &UvCommand::Sync {
                    extras: self.options.sync_extras.clone(),
                },
                out,
            )?;
            if !output.success() {
                writeln!(
                    out,
                    "uv sync failed but lock succeeded. Environment may be inconsistent."
                )?;
                surface(&output, err)?;
                return Ok(ResolutionOutcome::Failed(ResolutionFailure::Sync {
                    code: output.exit_code(),
                }));
            }
        }

        Ok(ResolutionOutcome::Resolved)
    }

    fn run(&self, command: &UvCommand, out: &mut dyn Write) -> Result<CommandOutput, AppError> {
        writeln!(out, "Running: {}", command.display(self.runner.program()))?;
        Ok(self.runner.run(command)?)
    }
}

fn site_kind(site: &DeclarationSite) -> &'static str {
    match site {
        DeclarationSite::Main => "main",
        DeclarationSite::Optional(_) => "optional",
        DeclarationSite::Group(_) => "group",
    }
}

/// Copy a failed command's stderr to the error stream
pub(crate) fn surface(output: &CommandOutput, err: &mut dyn Write) -> io::Result<()> {
    if !output.stderr.is_empty() {
        err.write_all(output.stderr.as_bytes())?;
        if !output.stderr.ends_with('\n') {
            writeln!(err)?;
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::{ScriptedPrompter, StaticOracle};
    use super::*;
    use crate::manifest::PyprojectManifest;
    use crate::package_manager::test_support::ScriptedRunner;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn workspace() -> (TempDir, WorkspaceMembers) {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pyproject.toml",
            "[project]\nname = \"root\"\n[tool.uv.workspace]\nmembers = [\"common\", \"qluster_sdk\"]\n",
        );
        write(
            dir.path(),
            "common/pyproject.toml",
            "[project]\nname = \"common\"\ndependencies = [\"pytest==8.0.0\"]\n[project.optional-dependencies]\ndev = [\"flake8==7.2.0\"]\n",
        );
        write(
            dir.path(),
            "qluster_sdk/pyproject.toml",
            "[project]\nname = \"qluster-sdk\"\n[project.optional-dependencies]\ndev = [\"flake8==7.3.0\"]\n[dependency-groups]\ntest = [\"pytest==8.1.0\"]\n",
        );
        let root = PyprojectManifest::load(dir.path().join("pyproject.toml")).unwrap();
        let members = WorkspaceMembers::discover(dir.path(), &root);
        (dir, members)
    }

    fn flake8() -> WorkspaceConflict {
        WorkspaceConflict::new("flake8", "dev", [("common", "7.2.0"), ("qluster-sdk", "7.3.0")]).unwrap()
    }

    fn pytest() -> WorkspaceConflict {
        WorkspaceConflict::new("pytest", "dev", [("common", "8.0.0"), ("qluster-sdk", "8.1.0")]).unwrap()
    }

    fn auto() -> ResolverOptions {
        ResolverOptions {
            auto_accept: true,
            ..Default::default()
        }
    }

    async fn resolve(
        runner: &ScriptedRunner,
        oracle: &StaticOracle,
        prompter: &ScriptedPrompter,
        members: &WorkspaceMembers,
        options: &ResolverOptions,
        conflicts: Vec<WorkspaceConflict>,
    ) -> (ResolutionOutcome, String, String) {
        let resolver = ConflictResolver::new(runner, oracle, prompter, members, options);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = resolver.resolve(conflicts, &mut out, &mut err).await.unwrap();
        (
            outcome,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(TargetPolicy::parse("latest").unwrap(), TargetPolicy::Latest);
        assert_eq!("MAX".parse::<TargetPolicy>().unwrap(), TargetPolicy::Max);
        assert!(matches!(
            TargetPolicy::parse("newest"),
            Err(ConfigError::UnknownPolicy { .. })
        ));
        assert_eq!(TargetPolicy::Max.to_string(), "max");
    }

    #[test]
    fn test_ci_values() {
        for v in ["true", "TRUE", "1", "yes", "Yes"] {
            assert!(is_ci_value(Some(v)), "{v}");
        }
        for v in ["", "0", "false", "no"] {
            assert!(!is_ci_value(Some(v)), "{v}");
        }
        assert!(!is_ci_value(None));
    }

    #[test]
    fn test_yes_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[tokio::test]
    async fn test_max_policy_picks_largest_pin() {
        let oracle = StaticOracle::new(&[("flake8", "9.9.9")]);
        let targets = determine_target_versions(&[flake8()], TargetPolicy::Max, &oracle).await;
        assert_eq!(targets["flake8"], "7.3.0");
    }

    #[tokio::test]
    async fn test_latest_policy_prefers_oracle_then_falls_back() {
        let oracle = StaticOracle::new(&[("flake8", "7.4.0")]);
        let targets =
            determine_target_versions(&[flake8(), pytest()], TargetPolicy::Latest, &oracle).await;
        assert_eq!(targets["flake8"], "7.4.0");
        assert_eq!(targets["pytest"], "8.1.0");
    }

    #[tokio::test]
    async fn test_auto_accept_aligns_locks_and_succeeds() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::new(&[("flake8", "7.4.0")]);
        let prompter = ScriptedPrompter::new("n");

        let (outcome, out, _) =
            resolve(&runner, &oracle, &prompter, &members, &auto(), vec![flake8()]).await;

        assert_eq!(outcome, ResolutionOutcome::Resolved);
        assert_eq!(prompter.asked(), 0);
        assert_eq!(
            runner.rendered(),
            vec![
                "uv add --project common --frozen --optional dev flake8==7.4.0",
                "uv add --project qluster_sdk --frozen --optional dev flake8==7.4.0",
                "uv lock",
            ]
        );
        assert!(out.contains("Conflicts detected in extra \"dev\" across 2 members:"));
        assert!(out.contains("flake8: common(==7.2.0) ↔ qluster-sdk(==7.3.0) → 7.4.0"));
        assert!(out.contains("Workspace conflicts resolved successfully"));
    }

    #[tokio::test]
    async fn test_oracle_miss_falls_back_to_max_pin() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("");

        let (outcome, _, _) =
            resolve(&runner, &oracle, &prompter, &members, &auto(), vec![flake8()]).await;

        assert_eq!(outcome, ResolutionOutcome::Resolved);
        assert!(runner.rendered()[0].ends_with("flake8==7.3.0"));
    }

    #[tokio::test]
    async fn test_sites_are_located_per_member() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::new(&[("flake8", "7.4.0"), ("pytest", "8.2.0")]);
        let prompter = ScriptedPrompter::new("");
        let options = ResolverOptions {
            sync: true,
            sync_extras: vec!["dev".into()],
            ..auto()
        };

        let (outcome, _, _) =
            resolve(&runner, &oracle, &prompter, &members, &options, vec![flake8(), pytest()]).await;

        assert_eq!(outcome, ResolutionOutcome::Resolved);
        assert_eq!(
            runner.rendered(),
            vec![
                "uv add --project common --frozen pytest==8.2.0",
                "uv add --project common --frozen --optional dev flake8==7.4.0",
                "uv add --project qluster_sdk --frozen --optional dev flake8==7.4.0",
                "uv add --project qluster_sdk --frozen --group test pytest==8.2.0",
                "uv lock",
                "uv sync --extra dev",
            ]
        );
    }

    #[tokio::test]
    async fn test_declined_prints_manual_commands() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::new(&[("flake8", "7.4.0")]);
        let prompter = ScriptedPrompter::new("n\n");

        let (outcome, out, _) = resolve(
            &runner,
            &oracle,
            &prompter,
            &members,
            &ResolverOptions::default(),
            vec![flake8()],
        )
        .await;

        assert_eq!(outcome, ResolutionOutcome::Declined);
        assert_eq!(prompter.asked(), 1);
        assert!(runner.calls().is_empty());
        assert!(out.contains("retry lock? [y/N] "));
        assert!(out.contains("  uv add --project common --optional dev flake8==7.4.0"));
        assert!(out.contains("  uv add --project qluster_sdk --optional dev flake8==7.4.0"));
        assert!(out.contains("Then run: uv lock"));
    }

    fn pydantic_workspace() -> (TempDir, WorkspaceMembers) {
        let (dir, _) = workspace();
        write(
            dir.path(),
            "common/pyproject.toml",
            "[project]\nname = \"common\"\ndependencies = [\"pydantic==2.11.7\"]\n",
        );
        write(
            dir.path(),
            "qluster_sdk/pyproject.toml",
            "[project]\nname = \"qluster-sdk\"\n[project.optional-dependencies]\ndev = [\"pydantic==2.11.5\"]\n",
        );
        let root = PyprojectManifest::load(dir.path().join("pyproject.toml")).unwrap();
        let members = WorkspaceMembers::discover(dir.path(), &root);
        (dir, members)
    }

    fn pydantic() -> WorkspaceConflict {
        WorkspaceConflict::new(
            "pydantic",
            "dev",
            [("common", "2.11.7"), ("qluster-sdk", "2.11.5")],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_declined_commands_follow_declaration_sites() {
        let (_dir, members) = pydantic_workspace();
        let oracle = StaticOracle::new(&[("pydantic", "2.11.9")]);

        let declined_runner = ScriptedRunner::default();
        let (outcome, out, _) = resolve(
            &declined_runner,
            &oracle,
            &ScriptedPrompter::new("n"),
            &members,
            &ResolverOptions::default(),
            vec![pydantic()],
        )
        .await;
        assert_eq!(outcome, ResolutionOutcome::Declined);
        assert!(out.contains("  uv add --project common pydantic==2.11.9\n"));
        assert!(out.contains("  uv add --project qluster_sdk --optional dev pydantic==2.11.9\n"));
        assert!(!out.contains("--project common --optional dev"));

        let accepted_runner = ScriptedRunner::default();
        let (outcome, _, _) = resolve(
            &accepted_runner,
            &oracle,
            &ScriptedPrompter::new(""),
            &members,
            &auto(),
            vec![pydantic()],
        )
        .await;
        assert_eq!(outcome, ResolutionOutcome::Resolved);
        assert_eq!(
            accepted_runner.rendered(),
            vec![
                "uv add --project common --frozen pydantic==2.11.9",
                "uv add --project qluster_sdk --frozen --optional dev pydantic==2.11.9",
                "uv lock",
            ]
        );
    }

    #[tokio::test]
    async fn test_mixed_extras_have_no_plan() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("y");
        let docs =
            WorkspaceConflict::new("sphinx", "docs", [("common", "7.0.0"), ("qluster-sdk", "7.1.0")])
                .unwrap();

        let (outcome, out, _) =
            resolve(&runner, &oracle, &prompter, &members, &auto(), vec![flake8(), docs]).await;

        assert_eq!(outcome, ResolutionOutcome::Failed(ResolutionFailure::NoPlan));
        assert!(runner.calls().is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_accepts_yes() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("yes\n");

        let (outcome, _, _) = resolve(
            &runner,
            &oracle,
            &prompter,
            &members,
            &ResolverOptions::default(),
            vec![flake8()],
        )
        .await;

        assert_eq!(outcome, ResolutionOutcome::Resolved);
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_align_failure_stops_before_lock() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::new([CommandOutput::failed(2, "error: bad project\n")]);
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("");

        let (outcome, out, err) =
            resolve(&runner, &oracle, &prompter, &members, &auto(), vec![flake8()]).await;

        assert_eq!(
            outcome,
            ResolutionOutcome::Failed(ResolutionFailure::Align {
                member: "common".into(),
                site: DeclarationSite::Optional("dev".into()),
                code: 2,
            })
        );
        assert_eq!(runner.calls().len(), 1);
        assert!(out.contains("Failed to stage optional deps for member 'common'"));
        assert_eq!(err, "error: bad project\n");
    }

    #[tokio::test]
    async fn test_lock_failure_is_reported() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::new([
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::failed(1, "lock exploded"),
        ]);
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("");

        let (outcome, out, err) =
            resolve(&runner, &oracle, &prompter, &members, &auto(), vec![flake8()]).await;

        assert_eq!(outcome, ResolutionOutcome::Failed(ResolutionFailure::Lock { code: 1 }));
        assert!(out.contains("Files have been modified"));
        assert_eq!(err, "lock exploded\n");
    }

    #[tokio::test]
    async fn test_sync_failure_is_reported() {
        let (_dir, members) = workspace();
        let runner = ScriptedRunner::new([
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::failed(3, ""),
        ]);
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("");
        let options = ResolverOptions {
            sync: true,
            ..auto()
        };

        let (outcome, out, _) =
            resolve(&runner, &oracle, &prompter, &members, &options, vec![flake8()]).await;

        assert_eq!(outcome, ResolutionOutcome::Failed(ResolutionFailure::Sync { code: 3 }));
        assert_eq!(ResolutionFailure::Sync { code: 3 }.exit_code(), 3);
        assert!(out.contains("Environment may be inconsistent"));
    }

    #[tokio::test]
    async fn test_empty_conflicts_have_no_plan() {
        let members = WorkspaceMembers::default();
        let runner = ScriptedRunner::default();
        let oracle = StaticOracle::default();
        let prompter = ScriptedPrompter::new("y");

        let (outcome, _, _) =
            resolve(&runner, &oracle, &prompter, &members, &auto(), Vec::new()).await;

        assert_eq!(outcome, ResolutionOutcome::Failed(ResolutionFailure::NoPlan));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_failure_messages() {
        let failure = ResolutionFailure::Align {
            member: "common".into(),
            site: DeclarationSite::Group("test".into()),
            code: 1,
        };
        assert_eq!(
            failure.to_string(),
            "failed to align dependency group 'test' for member 'common'"
        );
        assert!(ResolutionFailure::Lock { code: 1 }
            .to_string()
            .contains("lock step failed"));
    }
}
