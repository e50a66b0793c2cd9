use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use drushflow_core::config::ReviewConfig;
use drushflow_core::constants::CODER_RELEASE;
use glob::{MatchOptions, Pattern};
use tracing::{debug, info, instrument};

use crate::StepContext;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Makes sure Coder is present and enabled, then reviews every project under the root.
#[instrument(skip_all)]
pub fn run(ctx: &StepContext<'_>, cfg: &ReviewConfig) -> Result<bool> {
    let logs = ctx.ensure_logs_dir(&cfg.logs)?;
    let drush = ctx.drush(&cfg.root);
    let mut ok = true;

    if drush.is_extension_installed("coder", false) {
        info!(target: "drupal", "Coder already exists");
    } else {
        info!(target: "drupal", "Coder does not exist. Downloading Coder...");
        ok &= drush.download(&[CODER_RELEASE], Some("modules"));
    }

    if drush.is_extension_installed("coder_review", true) {
        info!(target: "drupal", "Coder is already enabled");
    } else {
        info!(target: "drupal", "Coder is not enabled. Enabling Coder...");
        ok &= drush.enable(&["coder_review"]);
    }

    let projects = collect_projects(drush.root(), &cfg.include, &cfg.except)?;
    debug!("reviewing {} project(s)", projects.len());

    ok &= drush.coder_review(&logs, &cfg.categories, &projects, cfg.ignores_pass);
    Ok(ok)
}

/// Names of the projects whose files match `include` and none of `except`,
/// both relative to `root`. `sites/all/modules/views/views.info` yields `views`.
///
/// Install profiles match too; Coder skips them on its own.
pub fn collect_projects(root: &Path, include: &str, except: &[String]) -> Result<Vec<String>> {
    let excludes = except
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| Pattern::new(p.trim()).with_context(|| format!("invalid exclude pattern '{p}'")))
        .collect::<Result<Vec<_>>>()?;

    let pattern = format!(
        "{}/{}",
        Pattern::escape(&root.to_string_lossy()),
        include.trim_start_matches('/')
    );
    let paths = glob::glob_with(&pattern, MATCH_OPTIONS)
        .with_context(|| format!("invalid include pattern '{include}'"))?;

    let mut names = BTreeSet::new();
    for entry in paths {
        let path = entry.context("failed to scan Drupal root")?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if excludes
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
        {
            debug!("excluded {}", relative.display());
            continue;
        }
        if let Some(stem) = path.file_stem() {
            names.insert(stem.to_string_lossy().to_string());
        }
    }

    Ok(names.into_iter().collect())
}
