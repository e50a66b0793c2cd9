use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};

use drushflow_core::{CommandRef, DrushflowConfig, PrimaryCommand};
use drushflow_steps::{run_profile, run_step, StepContext};
use tracing::{info, instrument};

use crate::Cli;

/// Profile run by a bare `run`.
const DEFAULT_PROFILE: &str = "ci";

/// Executes a parsed command. `Ok(false)` means a drush operation reported failure.
#[instrument(skip(cli, cfg, ctx))]
pub fn execute(
    cli: &Cli,
    cfg: &DrushflowConfig,
    ctx: &StepContext<'_>,
    command: &CommandRef,
) -> Result<bool> {
    match command.primary {
        PrimaryCommand::Make
        | PrimaryCommand::Install
        | PrimaryCommand::Test
        | PrimaryCommand::Review => {
            if let Some(selector) = &command.selector {
                bail!("'{}' takes no selector (got '{}')", command.primary.as_str(), selector);
            }
            let ok = run_step(ctx, cfg, command)?;
            println!("{command}: {}", verdict(ok));
            Ok(ok)
        }
        PrimaryCommand::Run => {
            let profile = command.selector.as_deref().unwrap_or(DEFAULT_PROFILE);
            println!("run:{profile} (project={})", cfg.project.name);
            let outcomes = run_profile(ctx, cfg, profile)?;
            for outcome in &outcomes {
                println!(" - {}: {}", outcome.step, verdict(outcome.ok));
            }
            Ok(outcomes.iter().all(|o| o.ok))
        }
        PrimaryCommand::Status => {
            let drush = ctx.drush(&site_root(cli, cfg));
            let installed = drush.query_site_installed()?;
            println!("{}", if installed { "installed" } else { "not installed" });
            Ok(true)
        }
        PrimaryCommand::List => {
            let (modules_only, enabled_only) = list_filters(command.selector.as_deref())?;
            let drush = ctx.drush(&site_root(cli, cfg));
            let listing = drush.query_extensions(modules_only, enabled_only)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            info!("{} extension(s)", listing.len());
            Ok(true)
        }
        PrimaryCommand::Init => Err(anyhow!("init is handled before config loading")),
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "failed"
    }
}

fn list_filters(selector: Option<&str>) -> Result<(bool, bool)> {
    match selector.unwrap_or("all") {
        "all" => Ok((false, false)),
        "modules" => Ok((true, false)),
        "enabled" => Ok((true, true)),
        other => Err(anyhow!(
            "unknown list selector '{other}' (supported: all,modules,enabled)"
        )),
    }
}

/// The Drupal root for ad-hoc queries: `--root`, else the first step section that names one.
fn site_root(cli: &Cli, cfg: &DrushflowConfig) -> PathBuf {
    let configured = [
        cfg.install.as_ref().map(|c| c.root.as_path()),
        cfg.test.as_ref().map(|c| c.root.as_path()),
        cfg.review.as_ref().map(|c| c.root.as_path()),
        cfg.make.as_ref().map(|c| c.root.as_path()),
    ];
    cli.root
        .clone()
        .or_else(|| {
            configured
                .into_iter()
                .flatten()
                .find(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
        .unwrap_or_default()
}
