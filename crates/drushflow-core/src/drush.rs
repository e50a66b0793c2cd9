//! The drush command adapter.
//!
//! Each method builds a fresh argument list, runs one blocking subprocess
//! through a [`ProcessRunner`] and interprets the result. Nothing is cached:
//! "is X enabled" is answered by listing extensions again.
//!
//! Expected failures never escape as errors from the plain methods. They are
//! logged under the `drupal` target and turned into `false` or an empty
//! collection. The `query_*` twins return the underlying [`DrushError`] for
//! callers that need to tell "empty" from "could not ask".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::coder::{plan_review, ReviewCategory};
use crate::constants::CODER_REPORT;
use crate::error::DrushError;
use crate::extension::{parse_extensions, Extension};
use crate::installation::DrushSettings;
use crate::process::{Invocation, OutputTarget, ProcessOutcome, ProcessRunner};
use crate::simpletest::{parse_tests, TestCase};

pub struct Drush<'r> {
    settings: DrushSettings,
    root: PathBuf,
    workspace: PathBuf,
    runner: &'r dyn ProcessRunner,
}

impl<'r> Drush<'r> {
    /// `root` is the Drupal root passed as `--root`; `workspace` is the
    /// working directory of every subprocess.
    pub fn new(
        settings: DrushSettings,
        root: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
        runner: &'r dyn ProcessRunner,
    ) -> Self {
        Self {
            settings,
            root: root.into(),
            workspace: workspace.into(),
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs `site-install <profile> --db-url=<url>`.
    pub fn site_install(&self, db_url: &str, profile: &str) -> bool {
        self.run_logged(vec![
            "site-install".to_string(),
            profile.to_string(),
            format!("--db-url={db_url}"),
        ])
    }

    /// Runs pending schema updates (`update.php`).
    pub fn update_db(&self) -> bool {
        self.run_logged(vec!["updatedb".to_string()])
    }

    /// Builds a codebase into `target` from a Makefile.
    pub fn make(&self, makefile: &Path, target: &Path) -> bool {
        self.run_logged(vec![
            "make".to_string(),
            makefile.to_string_lossy().to_string(),
            target.to_string_lossy().to_string(),
        ])
    }

    /// Downloads projects, optionally into `destination` below the root.
    pub fn download(&self, projects: &[&str], destination: Option<&str>) -> bool {
        let mut args = vec!["pm-download".to_string()];
        args.extend(projects.iter().map(|p| (*p).to_string()));
        if let Some(dir) = destination.filter(|d| !d.is_empty()) {
            args.push(format!("--destination={dir}"));
        }
        self.run_logged(args)
    }

    pub fn enable(&self, extensions: &[&str]) -> bool {
        let mut args = vec!["pm-enable".to_string()];
        args.extend(extensions.iter().map(|e| (*e).to_string()));
        self.run_logged(args)
    }

    /// Installed extensions keyed by machine name; empty if drush could not be asked.
    pub fn list_extensions(
        &self,
        modules_only: bool,
        enabled_only: bool,
    ) -> BTreeMap<String, Extension> {
        self.query_extensions(modules_only, enabled_only)
            .unwrap_or_else(|e| {
                error!(target: "drupal", "Could not list available projects: {e}");
                BTreeMap::new()
            })
    }

    pub fn query_extensions(
        &self,
        modules_only: bool,
        enabled_only: bool,
    ) -> Result<BTreeMap<String, Extension>, DrushError> {
        let mut args = vec![
            "pm-list".to_string(),
            "--pipe".to_string(),
            "--format=json".to_string(),
        ];
        if modules_only {
            args.push("--type=module".to_string());
        }
        if enabled_only {
            args.push("--status=enabled".to_string());
        }
        let outcome = self.execute(self.invocation(args, OutputTarget::Capture))?;
        parse_extensions(&String::from_utf8_lossy(&outcome.stdout))
    }

    /// Whether module `name` exists (or is enabled, with `enabled_only`).
    pub fn is_extension_installed(&self, name: &str, enabled_only: bool) -> bool {
        self.list_extensions(true, enabled_only).contains_key(name)
    }

    /// Whether a site is installed, judged by `status` reporting a database name.
    pub fn is_site_installed(&self) -> bool {
        self.query_site_installed().unwrap_or_else(|e| {
            error!(target: "drupal", "Could not determine the site status: {e}");
            false
        })
    }

    pub fn query_site_installed(&self) -> Result<bool, DrushError> {
        let args = vec!["status".to_string(), "--format=json".to_string()];
        let outcome = self.execute(self.invocation(args, OutputTarget::Capture))?;
        parse_site_status(&String::from_utf8_lossy(&outcome.stdout))
    }

    /// Test classes Simpletest knows about; empty if drush could not be asked.
    pub fn list_tests(&self) -> Vec<TestCase> {
        self.query_tests().unwrap_or_else(|e| {
            error!(target: "drupal", "Could not list available tests: {e}");
            Vec::new()
        })
    }

    pub fn query_tests(&self) -> Result<Vec<TestCase>, DrushError> {
        let args = vec!["test-run".to_string(), "--format=json".to_string()];
        let outcome = self.execute(self.invocation(args, OutputTarget::Capture))?;
        parse_tests(&String::from_utf8_lossy(&outcome.stdout))
    }

    /// Runs Simpletest and leaves JUnit XML in `output_dir`. No targets means `--all`.
    pub fn test_run(&self, output_dir: &Path, uri: Option<&str>, targets: &[String]) -> bool {
        let mut args = vec![
            "test-run".to_string(),
            format!("--xml={}", output_dir.display()),
        ];
        if let Some(uri) = uri.filter(|u| !u.is_empty()) {
            args.push(format!("--uri={uri}"));
        }
        if targets.is_empty() {
            args.push("--all".to_string());
        } else {
            args.push(targets.join(","));
        }
        self.run_logged(args)
    }

    /// Reviews `projects` with Coder and writes a Checkstyle report to
    /// `<output_dir>/coder_review.xml`.
    pub fn coder_review(
        &self,
        output_dir: &Path,
        categories: &[ReviewCategory],
        projects: &[String],
        ignores_pass: bool,
    ) -> bool {
        self.report(self.try_coder_review(output_dir, categories, projects, ignores_pass))
    }

    fn try_coder_review(
        &self,
        output_dir: &Path,
        categories: &[ReviewCategory],
        projects: &[String],
        ignores_pass: bool,
    ) -> Result<(), DrushError> {
        let modules = self.list_extensions(true, true);
        let coder = modules.get("coder").ok_or(DrushError::CoderMissing)?;

        let plan = plan_review(&coder.version, categories, projects, ignores_pass)?;
        debug!("coder {} uses {:?}", coder.version, plan.dialect);

        if plan.ignores_pass_dropped {
            warn!(target: "drupal",
                "'Ignores pass' option is available only with Coder-7.x-2.4+, ignoring option"
            );
        }
        if !plan.conflicts.is_empty() {
            info!(target: "drupal",
                "Ignoring project(s) conflicting with Coder options: {}",
                plan.conflicts.join(", ")
            );
        }

        let report = output_dir.join(CODER_REPORT);
        self.execute(self.invocation(plan.args, OutputTarget::File(report)))?;
        Ok(())
    }

    fn invocation(&self, args: Vec<String>, output: OutputTarget) -> Invocation {
        let mut full = vec![
            "--yes".to_string(),
            "--nocolor".to_string(),
            format!("--root={}", self.root.display()),
        ];
        full.extend(args);
        Invocation {
            program: self.settings.executable.clone(),
            args: full,
            output,
        }
    }

    fn run_logged(&self, args: Vec<String>) -> bool {
        let invocation = self.invocation(args, OutputTarget::Log);
        self.report(self.execute(invocation).map(|_| ()))
    }

    fn execute(&self, invocation: Invocation) -> Result<ProcessOutcome, DrushError> {
        debug!("exec {}", invocation.display());
        let outcome = self
            .runner
            .run(&invocation, &self.workspace, &self.settings.env)?;

        if !outcome.success() {
            let subcommand = invocation.subcommand().to_string();
            let Some(code) = outcome.code else {
                return Err(DrushError::Interrupted { subcommand });
            };
            if self.settings.strict_exit_codes {
                return Err(DrushError::NonZeroExit { subcommand, code });
            }
            warn!(target: "drupal", "drush {subcommand} exited with status {code}");
        }

        Ok(outcome)
    }

    fn report(&self, result: Result<(), DrushError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(target: "drupal", "{e}");
                false
            }
        }
    }
}

/// Reads `drush status --format=json`; a site counts as installed once it has a database name.
pub fn parse_site_status(text: &str) -> Result<bool, DrushError> {
    let document: Value = serde_json::from_str(text).map_err(|source| DrushError::Malformed {
        what: "site status",
        source,
    })?;
    match document {
        Value::Object(values) => Ok(values.contains_key("db-name")),
        Value::Array(items) if items.is_empty() => Ok(false),
        _ => Err(DrushError::UnexpectedShape {
            what: "site status",
            expected: "object",
        }),
    }
}
