use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of a single drush invocation.
///
/// The adapter's degrading methods log these and collapse them to
/// `false` or an empty collection; the `query_*` methods return them.
#[derive(Debug, Error)]
pub enum DrushError {
    #[error("failed to start '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The process died from a signal, e.g. a cancelled build.
    #[error("drush {subcommand} was interrupted by a signal")]
    Interrupted { subcommand: String },
    #[error("failed to open report file '{}': {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{what} is not a JSON {expected}")]
    UnexpectedShape {
        what: &'static str,
        expected: &'static str,
    },
    #[error("Coder does not exist: aborting code review")]
    CoderMissing,
    #[error("unsupported Coder version {0}")]
    UnsupportedCoder(String),
    #[error("drush {subcommand} exited with status {code}")]
    NonZeroExit { subcommand: String, code: i32 },
}
