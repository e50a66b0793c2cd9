//! Resolution of the drush executable and the settings every invocation shares.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::config::DrushConfig;
use crate::constants::DEFAULT_DRUSH;

/// Everything an invocation needs to know about drush itself.
#[derive(Debug, Clone)]
pub struct DrushSettings {
    pub executable: String,
    pub env: HashMap<String, String>,
    pub strict_exit_codes: bool,
}

impl Default for DrushSettings {
    fn default() -> Self {
        Self {
            executable: DEFAULT_DRUSH.to_string(),
            env: HashMap::new(),
            strict_exit_codes: false,
        }
    }
}

impl DrushSettings {
    pub fn from_config(cfg: &DrushConfig) -> Self {
        let mut env = cfg.env.clone();
        if let Some(home) = &cfg.home {
            env.entry("DRUSH_HOME".to_string())
                .or_insert_with(|| home.to_string_lossy().to_string());
        }
        Self {
            executable: resolve_executable(cfg),
            env,
            strict_exit_codes: cfg.strict_exit_codes,
        }
    }
}

/// Picks the executable: explicit path, then `<home>/drush`, then the bare name on `PATH`.
pub fn resolve_executable(cfg: &DrushConfig) -> String {
    if let Some(exe) = cfg.executable.as_deref().filter(|e| !e.trim().is_empty()) {
        debug!("using configured drush executable {exe}");
        return exe.to_string();
    }

    let Some(home) = &cfg.home else {
        info!(target: "drupal", "No Drush installation configured, fall back to '{DEFAULT_DRUSH}'");
        return DEFAULT_DRUSH.to_string();
    };

    let candidate = Path::new(home).join(DEFAULT_DRUSH);
    if candidate.is_file() {
        return candidate.to_string_lossy().to_string();
    }

    info!(target: "drupal",
        "Drush executable '{}' could not be found, fall back to '{DEFAULT_DRUSH}'",
        candidate.display()
    );
    DEFAULT_DRUSH.to_string()
}
