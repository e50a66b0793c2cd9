use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::coder::ReviewCategory;
use crate::constants::{DEFAULT_PROFILE, DEFAULT_REVIEW_INCLUDE};

#[derive(Debug, Deserialize)]
pub struct DrushflowConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub drush: DrushConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    pub make: Option<MakeConfig>,
    pub install: Option<InstallConfig>,
    pub test: Option<TestConfig>,
    pub review: Option<ReviewConfig>,
}

impl DrushflowConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let cfg = toml::from_str::<Self>(&text)
            .with_context(|| format!("failed to parse TOML config: {path}"))?;
        cfg.validate()
            .with_context(|| format!("invalid config: {path}"))?;
        Ok(cfg)
    }

    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if let Some(make) = &self.make {
            if make.root.as_os_str().is_empty() {
                bail!("[make] root must be set: drush make needs an empty directory, not the workspace");
            }
            if !make
                .root
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
            {
                bail!(
                    "[make] root '{}' must be a relative path inside the workspace",
                    make.root.display()
                );
            }
            if make.makefile.is_some() == make.makefile_path.is_some() {
                bail!("[make] needs exactly one of 'makefile' or 'makefile_path'");
            }
        }
        if let Some(install) = &self.install {
            if install.db_url.trim().is_empty() {
                bail!("[install] db_url must not be empty");
            }
        }
        if let Some(test) = &self.test {
            if test.logs.as_os_str().is_empty() {
                bail!("[test] logs directory must be set");
            }
        }
        if let Some(review) = &self.review {
            if review.logs.as_os_str().is_empty() {
                bail!("[review] logs directory must be set");
            }
        }
        Ok(())
    }

    /// The workspace the config points at, resolved against `base`.
    pub fn workspace(&self, base: &Path) -> PathBuf {
        match &self.project.workspace {
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub workspace: Option<PathBuf>,
}

/// Where drush lives and how it is run.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DrushConfig {
    /// Installation directory holding the `drush` launcher.
    pub home: Option<PathBuf>,
    /// Explicit executable; wins over `home`.
    pub executable: Option<String>,
    /// Treat a non-zero drush exit status as failure.
    #[serde(default)]
    pub strict_exit_codes: bool,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TargetsConfig {
    #[serde(flatten)]
    pub profiles: HashMap<String, Vec<String>>,
}

/// Builds the codebase from a drush Makefile.
#[derive(Debug, Clone, Deserialize)]
pub struct MakeConfig {
    pub root: PathBuf,
    /// Inline Makefile content.
    pub makefile: Option<String>,
    /// Path to a Makefile, relative to the workspace.
    pub makefile_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallConfig {
    pub db_url: String,
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Reinstall even when a site is already present.
    #[serde(default)]
    pub refresh: bool,
    #[serde(default)]
    pub update_db: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    pub uri: Option<String>,
    #[serde(default)]
    pub root: PathBuf,
    pub logs: PathBuf,
    #[serde(default)]
    pub except_groups: Vec<String>,
    #[serde(default)]
    pub except_classes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub root: PathBuf,
    pub logs: PathBuf,
    #[serde(default = "default_categories")]
    pub categories: Vec<ReviewCategory>,
    #[serde(default = "default_include")]
    pub include: String,
    #[serde(default)]
    pub except: Vec<String>,
    #[serde(default)]
    pub ignores_pass: bool,
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_include() -> String {
    DEFAULT_REVIEW_INCLUDE.to_string()
}

fn default_categories() -> Vec<ReviewCategory> {
    ReviewCategory::ALL.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> DrushflowConfig {
        toml::from_str(text).expect("fixture config should parse")
    }

    #[test]
    fn parses_full_config() {
        let cfg = parse(
            r#"
            [project]
            name = "site"

            [drush]
            home = "/opt/drush"
            strict_exit_codes = true
            [drush.env]
            PHP_OPTIONS = "-d memory_limit=512M"

            [targets]
            ci = ["make", "install", "test", "review"]

            [make]
            root = "drupal"
            makefile = "core = 7.x"

            [install]
            db_url = "mysql://u:p@localhost/site"
            root = "drupal"

            [test]
            uri = "http://localhost"
            root = "drupal"
            logs = "logs"
            except_groups = ["Core"]

            [review]
            root = "drupal"
            logs = "logs"
            categories = ["style", "security"]
            "#,
        );

        assert!(cfg.validate().is_ok());
        assert!(cfg.drush.strict_exit_codes);
        assert_eq!(cfg.drush.env["PHP_OPTIONS"], "-d memory_limit=512M");
        assert_eq!(cfg.targets.profiles["ci"].len(), 4);

        let install = cfg.install.unwrap();
        assert_eq!(install.profile, "standard");
        assert!(!install.refresh);

        let review = cfg.review.unwrap();
        assert_eq!(
            review.categories,
            vec![ReviewCategory::Style, ReviewCategory::Security]
        );
        assert_eq!(review.include, "**/*.info");
    }

    #[test]
    fn review_defaults_to_every_category() {
        let cfg = parse(
            r#"
            [project]
            name = "site"
            [review]
            logs = "logs"
            "#,
        );
        assert_eq!(cfg.review.unwrap().categories.len(), 5);
    }

    #[test]
    fn make_needs_exactly_one_makefile_source() {
        let both = parse(
            r#"
            [project]
            name = "site"
            [make]
            root = "drupal"
            makefile = "core = 7.x"
            makefile_path = "site.make"
            "#,
        );
        assert!(both.validate().is_err());

        let neither = parse(
            r#"
            [project]
            name = "site"
            [make]
            root = "drupal"
            "#,
        );
        assert!(neither.validate().is_err());
    }

    #[test]
    fn make_rejects_workspace_root() {
        let cfg = parse(
            r#"
            [project]
            name = "site"
            [make]
            root = ""
            makefile_path = "site.make"
            "#,
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn make_rejects_roots_escaping_the_workspace() {
        for root in ["..", ".", "/srv/drupal", "drupal/../../etc"] {
            let cfg = parse(&format!(
                r#"
                [project]
                name = "site"
                [make]
                root = "{root}"
                makefile_path = "site.make"
                "#
            ));
            assert!(cfg.validate().is_err(), "root {root} must be rejected");
        }
    }

    #[test]
    fn workspace_resolves_against_base() {
        let cfg = parse(
            r#"
            [project]
            name = "site"
            workspace = "build"
            "#,
        );
        assert_eq!(cfg.workspace(Path::new("/ci")), PathBuf::from("/ci/build"));
    }
}
