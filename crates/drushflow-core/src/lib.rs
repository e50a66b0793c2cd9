//! Core logic for driving drush from a CI build.
//!
//! This crate holds the drush command adapter, the records it parses out of
//! drush's JSON output, the process-runner seam it executes through, and the
//! project configuration shared across the drushflow workspace.

pub mod coder;
pub mod command;
pub mod config;
pub mod constants;
pub mod drush;
pub mod error;
pub mod extension;
pub mod installation;
pub mod process;
pub mod simpletest;

pub use coder::{CoderDialect, ReviewCategory};
pub use command::{CommandRef, PrimaryCommand};
pub use config::{DrushflowConfig, TargetsConfig};
pub use drush::Drush;
pub use error::DrushError;
pub use extension::Extension;
pub use installation::DrushSettings;
pub use process::{Invocation, OutputTarget, ProcessOutcome, ProcessRunner, SystemRunner};
pub use simpletest::{TestCase, TestFilter};
