use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, instrument};

use crate::error::DrushError;

/// Where a subprocess's stdout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Streamed live to the build log, stderr included.
    Log,
    /// Buffered in memory for parsing; stderr is discarded.
    Capture,
    /// Written to a report file; stderr is discarded so it cannot corrupt the XML.
    File(PathBuf),
}

/// A fully built command line and where its output should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub output: OutputTarget,
}

impl Invocation {
    /// The drush subcommand, i.e. the first argument that is not an option.
    pub fn subcommand(&self) -> &str {
        self.args
            .iter()
            .find(|arg| !arg.starts_with('-'))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What came back from a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout; empty unless the target was [`OutputTarget::Capture`].
    pub stdout: Vec<u8>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs invocations to completion. The seam between the adapter and the OS.
pub trait ProcessRunner: std::fmt::Debug {
    fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> Result<ProcessOutcome, DrushError>;
}

/// Spawns real processes with `std::process::Command` and blocks until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    #[instrument(skip(self, env), fields(cmd = %invocation.display()))]
    fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> Result<ProcessOutcome, DrushError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(cwd)
            .envs(env)
            .stdin(Stdio::null());

        match &invocation.output {
            OutputTarget::Log => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputTarget::Capture => {
                command.stdout(Stdio::piped()).stderr(Stdio::null());
            }
            OutputTarget::File(path) => {
                let file = File::create(path).map_err(|source| DrushError::Report {
                    path: path.clone(),
                    source,
                })?;
                command.stdout(Stdio::from(file)).stderr(Stdio::null());
            }
        }

        let child = command.spawn().map_err(|source| DrushError::Launch {
            program: invocation.program.clone(),
            source,
        })?;

        let output = child
            .wait_with_output()
            .map_err(|source| DrushError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        debug!("{} exited with {}", invocation.subcommand(), output.status);

        Ok(ProcessOutcome {
            code: output.status.code(),
            stdout: output.stdout,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("fake-drush");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().to_string()
    }

    fn invocation(program: String, output: OutputTarget) -> Invocation {
        Invocation {
            program,
            args: vec!["--yes".into(), "status".into()],
            output,
        }
    }

    #[test]
    fn captures_stdout_and_drops_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, r#"echo '{"db-name":"x"}'; echo noise >&2"#);

        let outcome = SystemRunner
            .run(
                &invocation(program, OutputTarget::Capture),
                dir.path(),
                &HashMap::new(),
            )
            .unwrap();

        assert!(outcome.success());
        assert_eq!(String::from_utf8_lossy(&outcome.stdout).trim(), r#"{"db-name":"x"}"#);
    }

    #[test]
    fn writes_report_files_without_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "echo '<checkstyle/>'; echo warning >&2");
        let report = dir.path().join("report.xml");

        SystemRunner
            .run(
                &invocation(program, OutputTarget::File(report.clone())),
                dir.path(),
                &HashMap::new(),
            )
            .unwrap();

        assert_eq!(fs::read_to_string(report).unwrap(), "<checkstyle/>\n");
    }

    #[test]
    fn passes_environment_and_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, r#"echo "$DRUSH_HOME:$(pwd)"; exit 3"#);
        let env = HashMap::from([("DRUSH_HOME".to_string(), "/opt/drush".to_string())]);

        let outcome = SystemRunner
            .run(&invocation(program, OutputTarget::Capture), dir.path(), &env)
            .unwrap();

        let text = String::from_utf8_lossy(&outcome.stdout).to_string();
        assert!(text.starts_with("/opt/drush:"));
        assert_eq!(outcome.code, Some(3));
        assert!(!outcome.success());
    }

    #[test]
    fn signal_termination_has_no_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let program = script(&dir, "kill -TERM $$");

        let outcome = SystemRunner
            .run(
                &invocation(program, OutputTarget::Capture),
                dir.path(),
                &HashMap::new(),
            )
            .unwrap();

        assert_eq!(outcome.code, None);
        assert!(!outcome.success());
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemRunner
            .run(
                &invocation("/nonexistent/drush".into(), OutputTarget::Log),
                dir.path(),
                &HashMap::new(),
            )
            .expect_err("spawn must fail");
        assert!(matches!(err, DrushError::Launch { .. }));
    }

    #[test]
    fn subcommand_skips_global_options() {
        let inv = invocation("drush".into(), OutputTarget::Log);
        assert_eq!(inv.subcommand(), "status");
        assert_eq!(inv.display(), "drush --yes status");
    }
}
