//! uvrepin - repin direct pyproject.toml dependencies with uv
//!
//! Bumps every `name==version` requirement in `[project] dependencies`,
//! optional extras and dependency groups to the latest release, then
//! relocks (and optionally syncs) the environment.

use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uvrepin::cli::CliArgs;
use uvrepin::config::RepinConfig;
use uvrepin::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("uvrepin={level}")));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let ci = std::env::var("CI").ok();
    let config = RepinConfig::from_args(&args, ci.as_deref())?;

    if !config.output.color {
        colored::control::set_override(false);
    }

    // Print version info in verbose mode
    if config.output.is_verbose() {
        eprintln!("uvrepin v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Target: {}", config.project_dir.display());
        if config.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let orchestrator = Orchestrator::from_config(config)?;

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr();
    let status = orchestrator.run(&mut stdout, &mut stderr).await?;
    stdout.flush()?;

    let code = status.exit_code().clamp(0, 255) as u8;
    Ok(ExitCode::from(code))
}
