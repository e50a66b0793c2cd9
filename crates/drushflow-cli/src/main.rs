use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use drushflow_core::{CommandRef, DrushSettings, DrushflowConfig, PrimaryCommand, SystemRunner};
use drushflow_steps::StepContext;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod executor;
mod init;
mod styles;

use styles as s;

/// The command-line interface for drushflow.
#[derive(Debug, Parser)]
#[command(name = "drushflow")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(about = "Build, test and review Drupal sites with drush in CI")]
#[command(
    long_about = "drushflow drives a Drupal site through a CI build: it assembles the
codebase from a drush Makefile, installs the site, runs Simpletest and runs
the Coder reviewer. JUnit and Checkstyle reports land in the logs directory.

Commands:
  init              Write a starter drushflow.toml
  make              Build the codebase from the configured Makefile
  install           Install the site (skipped when already installed)
  test              Run Simpletest, minus excluded groups and classes
  review            Run Coder and write logs/coder_review.xml
  status            Report whether the site is installed
  list:modules      Print installed extensions as JSON (also list:all, list:enabled)
  run:ci            Run every step of a [targets] profile
"
)]
pub(crate) struct Cli {
    /// Command in canonical form, for example: `install`, `list:enabled`, `run:ci`
    command: Option<String>,
    /// Optional selector (supports `drushflow run ci` style)
    selector: Option<String>,
    /// Path to drushflow config file.
    #[arg(long, default_value = "drushflow.toml")]
    config: String,
    /// Build workspace; overrides `[project] workspace`.
    #[arg(long)]
    workspace: Option<PathBuf>,
    /// Drupal root for `status` and `list`, relative to the workspace.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Print the generated config to stdout instead of writing it (`init`).
    #[arg(long, default_value_t = false)]
    stdout: bool,
    /// Overwrite generated files if they already exist.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    let command_name = match &cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let command_text = match &cli.selector {
        Some(selector) => format!("{}:{}", command_name, selector),
        None => command_name.clone(),
    };

    let command = CommandRef::from_str(&command_text)
        .map_err(|e| anyhow!("failed to parse command '{}': {e}", command_text))?;

    if command.primary == PrimaryCommand::Init {
        return init::run(&cli, command.selector.as_deref());
    }

    let cfg = DrushflowConfig::load_from_file(&cli.config)
        .with_context(|| format!("unable to load config '{}'", cli.config))?;

    let workspace = resolve_workspace(&cli, &cfg)?;
    let settings = DrushSettings::from_config(&cfg.drush);
    debug!("drush executable: {}", settings.executable);

    let runner = SystemRunner;
    let ctx = StepContext::new(workspace, settings, &runner);

    if !executor::execute(&cli, &cfg, &ctx, &command)? {
        bail!("{} finished with failures, see the log above", command);
    }
    Ok(())
}

/// Subprocesses run inside the workspace, so every path handed to drush must be absolute.
fn resolve_workspace(cli: &Cli, cfg: &DrushflowConfig) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let workspace = match &cli.workspace {
        Some(dir) => cwd.join(dir),
        None => cfg.workspace(&cwd),
    };
    std::fs::canonicalize(&workspace)
        .with_context(|| format!("workspace '{}' is not accessible", workspace.display()))
}
