//! Constants used across the drushflow workspace.

/// The filename for drushflow's primary configuration.
pub const CONFIG_FILE: &str = "drushflow.toml";

/// Executable used when no drush installation is configured.
#[cfg(not(windows))]
pub const DEFAULT_DRUSH: &str = "drush";
#[cfg(windows)]
pub const DEFAULT_DRUSH: &str = "drush.bat";

/// Inline Makefile content is saved here, relative to the workspace.
pub const MAKEFILE_FILE: &str = "drupal.make";

/// Checkstyle report written by a code review, relative to the logs directory.
pub const CODER_REPORT: &str = "coder_review.xml";

/// `drush dl coder` fetches 7.x-1.x, so the 2.x release is pinned.
pub const CODER_RELEASE: &str = "coder-7.x-2.5";

/// Matches every module, theme and install profile in a Drupal tree.
pub const DEFAULT_REVIEW_INCLUDE: &str = "**/*.info";

/// Install profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "standard";
