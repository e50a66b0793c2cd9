use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use drushflow_core::{CommandRef, DrushflowConfig, PrimaryCommand};
use tracing::{info, instrument};

use crate::{instance, makefile, review, simpletest, StepContext};

/// Result of one step within a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: CommandRef,
    pub ok: bool,
}

/// Parses the build steps listed under `[targets] <profile>`.
pub fn resolve_profile(cfg: &DrushflowConfig, profile: &str) -> Result<Vec<CommandRef>> {
    let entries = cfg
        .targets
        .profiles
        .get(profile)
        .ok_or_else(|| anyhow!("unknown pipeline profile '{profile}'"))?;

    entries
        .iter()
        .map(|item| {
            let cmd = CommandRef::from_str(item).map_err(|e| anyhow!(e))?;
            if !cmd.primary.is_step() {
                bail!("'{item}' in profile '{profile}' is not a build step");
            }
            Ok(cmd)
        })
        .collect()
}

/// Runs a single build step with its config section.
#[instrument(skip_all, fields(step = %step))]
pub fn run_step(ctx: &StepContext<'_>, cfg: &DrushflowConfig, step: &CommandRef) -> Result<bool> {
    match step.primary {
        PrimaryCommand::Make => makefile::run(ctx, section(&cfg.make, "make")?),
        PrimaryCommand::Install => instance::run(ctx, section(&cfg.install, "install")?),
        PrimaryCommand::Test => simpletest::run(ctx, section(&cfg.test, "test")?),
        PrimaryCommand::Review => review::run(ctx, section(&cfg.review, "review")?),
        _ => bail!("'{step}' is not a build step"),
    }
}

/// Runs every step of a profile in order. A step that reports failure does
/// not stop the ones after it; local errors do.
pub fn run_profile(
    ctx: &StepContext<'_>,
    cfg: &DrushflowConfig,
    profile: &str,
) -> Result<Vec<StepOutcome>> {
    let steps = resolve_profile(cfg, profile)?;
    let mut outcomes = Vec::with_capacity(steps.len());
    for step in steps {
        info!(target: "drupal", "run {step}");
        let ok = run_step(ctx, cfg, &step)?;
        outcomes.push(StepOutcome { step, ok });
    }
    Ok(outcomes)
}

fn section<'c, T>(value: &'c Option<T>, name: &str) -> Result<&'c T> {
    value
        .as_ref()
        .ok_or_else(|| anyhow!("step '{name}' needs a [{name}] section in the config"))
}
