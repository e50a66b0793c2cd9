//! Build steps that drive a Drupal site through a CI run.
//!
//! Each step owns one concern of the build (codebase, site instance, tests,
//! code review) and talks to drush only through [`drushflow_core::Drush`].
//! A step returns `Err` for local failures such as an unwritable logs
//! directory, and `Ok(false)` when drush reported a failure.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use drushflow_core::{Drush, DrushSettings, ProcessRunner};
use tracing::info;

pub mod instance;
pub mod makefile;
pub mod pipeline;
pub mod review;
pub mod simpletest;

#[cfg(test)]
mod fake;

pub use pipeline::{resolve_profile, run_profile, run_step, StepOutcome};

/// What every step needs: where the build runs and how to reach drush.
#[derive(Debug)]
pub struct StepContext<'r> {
    pub workspace: PathBuf,
    pub settings: DrushSettings,
    pub runner: &'r dyn ProcessRunner,
}

impl<'r> StepContext<'r> {
    pub fn new(
        workspace: impl Into<PathBuf>,
        settings: DrushSettings,
        runner: &'r dyn ProcessRunner,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            settings,
            runner,
        }
    }

    /// Resolves a workspace-relative path; an empty path is the workspace itself.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.as_os_str().is_empty() {
            self.workspace.clone()
        } else {
            self.workspace.join(relative)
        }
    }

    /// A drush adapter rooted at the workspace-relative Drupal `root`.
    pub fn drush(&self, root: &Path) -> Drush<'r> {
        Drush::new(
            self.settings.clone(),
            self.resolve(root),
            self.workspace.clone(),
            self.runner,
        )
    }

    /// Creates the workspace-relative logs directory if needed.
    pub fn ensure_logs_dir(&self, logs: &Path) -> Result<PathBuf> {
        let dir = self.resolve(logs);
        if !dir.exists() {
            info!(target: "drupal", "Creating logs directory {}", logs.display());
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create logs directory '{}'", dir.display()))?;
        }
        Ok(dir)
    }
}
