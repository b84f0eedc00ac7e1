//! Package manager integration
//!
//! This module provides:
//! - The `uv` commands this tool issues, as data
//! - A runner trait so the orchestrator and resolver can be driven by a
//!   scripted runner in tests
//! - The system runner that spawns the real executable

use crate::domain::DeclarationSite;
use crate::error::CommandError;
use std::path::PathBuf;
use std::process::Command;

/// Captured result of one package manager invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// A successful invocation with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Non-zero exit code to propagate, 1 when the process had none
    pub fn exit_code(&self) -> i32 {
        match self.code {
            Some(0) | None => 1,
            Some(code) => code,
        }
    }
}

/// Arguments of one `uv add` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommand {
    /// Member directory passed as `--project`
    pub project: Option<PathBuf>,
    /// Edit manifests without resolving (`--frozen`)
    pub frozen: bool,
    /// Where the requirements are declared
    pub site: DeclarationSite,
    /// Pass `--prerelease allow`
    pub prerelease: bool,
    /// Extra package indexes
    pub indexes: Vec<String>,
    /// Requirement specifiers such as `flake8==7.3.0`
    pub requirements: Vec<String>,
}

impl AddCommand {
    /// A resolving add for the given site and specifiers
    pub fn new(site: DeclarationSite, requirements: Vec<String>) -> Self {
        Self {
            project: None,
            frozen: false,
            site,
            prerelease: false,
            indexes: Vec::new(),
            requirements,
        }
    }

    /// A frozen add for the given site and specifiers
    pub fn frozen(site: DeclarationSite, requirements: Vec<String>) -> Self {
        Self {
            frozen: true,
            ..Self::new(site, requirements)
        }
    }

    /// Target a workspace member directory
    pub fn with_project(mut self, project: impl Into<PathBuf>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Apply the prerelease and index options
    pub fn with_sources(mut self, prerelease: bool, indexes: &[String]) -> Self {
        self.prerelease = prerelease;
        self.indexes = indexes.to_vec();
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec!["add".to_string()];
        if let Some(project) = &self.project {
            args.push("--project".to_string());
            args.push(project.display().to_string());
        }
        if self.frozen {
            args.push("--frozen".to_string());
        }
        match &self.site {
            DeclarationSite::Main => {}
            DeclarationSite::Optional(extra) => {
                args.push("--optional".to_string());
                args.push(extra.clone());
            }
            DeclarationSite::Group(group) => {
                args.push("--group".to_string());
                args.push(group.clone());
            }
        }
        if self.prerelease {
            args.push("--prerelease".to_string());
            args.push("allow".to_string());
        }
        for index in &self.indexes {
            args.push("--index".to_string());
            args.push(index.clone());
        }
        args.extend(self.requirements.iter().cloned());
        args
    }
}

/// A package manager invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UvCommand {
    /// `uv --version`
    Version,
    /// `uv pip list --outdated`
    ListOutdated,
    /// `uv add ...`
    Add(AddCommand),
    /// `uv lock`
    Lock,
    /// `uv sync [--extra X]...`
    Sync { extras: Vec<String> },
}

impl UvCommand {
    /// Command line arguments, program excluded
    pub fn args(&self) -> Vec<String> {
        match self {
            UvCommand::Version => vec!["--version".to_string()],
            UvCommand::ListOutdated => vec![
                "pip".to_string(),
                "list".to_string(),
                "--outdated".to_string(),
            ],
            UvCommand::Add(add) => add.args(),
            UvCommand::Lock => vec!["lock".to_string()],
            UvCommand::Sync { extras } => {
                let mut args = vec!["sync".to_string()];
                for extra in extras {
                    args.push("--extra".to_string());
                    args.push(extra.clone());
                }
                args
            }
        }
    }

    /// Shell-style rendering, e.g. `uv add --frozen 'a==1; os_name == "nt"'`
    pub fn display(&self, program: &str) -> String {
        std::iter::once(program.to_string())
            .chain(self.args())
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.=/:+,@[]".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Trait for running package manager commands
pub trait CommandRunner: Send + Sync {
    /// Executable name used in messages
    fn program(&self) -> &str;

    /// Run a command to completion and capture its output
    fn run(&self, command: &UvCommand) -> Result<CommandOutput, CommandError>;
}

/// Runner that executes the real package manager
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: String,
    working_dir: PathBuf,
}

impl SystemRunner {
    /// Create a runner for `program` executing in `working_dir`
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.into(),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, command: &UvCommand) -> Result<CommandOutput, CommandError> {
        let rendered = command.display(&self.program);
        tracing::debug!(command = %rendered, "running package manager");

        let output = Command::new(&self.program)
            .args(command.args())
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| CommandError::spawn_failed(rendered, e))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Check that the package manager answers `--version`
pub fn ensure_available(runner: &dyn CommandRunner) -> Result<String, CommandError> {
    match runner.run(&UvCommand::Version) {
        Ok(output) if output.success() => {
            let version = output.stdout.trim().to_string();
            tracing::debug!(%version, "package manager available");
            Ok(version)
        }
        Ok(output) => {
            tracing::debug!(code = ?output.code, stderr = %output.stderr.trim(), "version check failed");
            Err(CommandError::not_found(runner.program()))
        }
        Err(err) => {
            tracing::debug!(%err, "version check failed");
            Err(CommandError::not_found(runner.program()))
        }
    }
}
