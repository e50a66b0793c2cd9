//! Codebase checkout from a drush Makefile.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use drushflow_core::config::MakeConfig;
use drushflow_core::constants::MAKEFILE_FILE;
use tracing::{info, instrument, warn};

use crate::StepContext;

/// Where the Makefile comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MakefileSource {
    /// Makefile text kept in the config; saved to `drupal.make` before use.
    Inline(String),
    /// An existing Makefile, relative to the workspace.
    Path(PathBuf),
}

impl MakefileSource {
    pub fn from_config(cfg: &MakeConfig) -> Result<Self> {
        match (&cfg.makefile, &cfg.makefile_path) {
            (Some(text), None) => Ok(Self::Inline(text.clone())),
            (None, Some(path)) => Ok(Self::Path(path.clone())),
            _ => Err(anyhow!(
                "[make] needs exactly one of 'makefile' or 'makefile_path'"
            )),
        }
    }
}

/// Rebuilds the Drupal root from scratch with `drush make`.
#[instrument(skip_all, fields(root = %cfg.root.display()))]
pub fn run(ctx: &StepContext<'_>, cfg: &MakeConfig) -> Result<bool> {
    let source = MakefileSource::from_config(cfg)?;
    let root = nested_root(&ctx.workspace, &cfg.root)?;

    // drush make wants an empty destination.
    if root.exists() {
        info!(target: "drupal", "Deleting destination directory {}", root.display());
        unlock_site_dir(&root);
        fs::remove_dir_all(&root)
            .with_context(|| format!("failed to delete '{}'", root.display()))?;
    }

    let makefile = match source {
        MakefileSource::Inline(text) => {
            let path = ctx.workspace.join(MAKEFILE_FILE);
            info!(target: "drupal", "Saving Makefile into {}", path.display());
            fs::write(&path, text)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            path
        }
        MakefileSource::Path(path) => ctx.resolve(&path),
    };

    Ok(ctx.drush(&cfg.root).make(&makefile, &root))
}

/// Drupal drops write permission on `sites/default`, which blocks deleting its contents.
fn unlock_site_dir(root: &Path) {
    let dir = root.join("sites").join("default");
    let Ok(metadata) = fs::metadata(&dir) else {
        return;
    };
    let mut perms = metadata.permissions();
    perms.set_readonly(false);
    if let Err(e) = fs::set_permissions(&dir, perms) {
        warn!("could not make {} writable: {e}", dir.display());
    }
}

/// The make root is wiped before every build, so it must sit strictly below the workspace.
fn nested_root(workspace: &Path, root: &Path) -> Result<PathBuf> {
    let relative_and_nested = root.components().next().is_some()
        && root.components().all(|c| matches!(c, Component::Normal(_)));
    if !relative_and_nested {
        bail!(
            "[make] root '{}' must be a relative path inside the workspace",
            root.display()
        );
    }

    let resolved = workspace.join(root);
    // A symlinked root could still point outside the workspace.
    if resolved.exists() {
        let canonical_root = fs::canonicalize(&resolved)
            .with_context(|| format!("failed to resolve '{}'", resolved.display()))?;
        let canonical_ws = fs::canonicalize(workspace)
            .with_context(|| format!("failed to resolve '{}'", workspace.display()))?;
        if !canonical_root.starts_with(&canonical_ws) || canonical_root == canonical_ws {
            bail!(
                "[make] root '{}' resolves outside the workspace",
                root.display()
            );
        }
    }
    Ok(resolved)
}
