use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use drushflow_core::{DrushError, Invocation, ProcessOutcome, ProcessRunner};

/// Stands in for drush: answers captured queries by subcommand and records every call.
#[derive(Debug, Default)]
pub struct FakeDrush {
    replies: HashMap<String, String>,
    calls: RefCell<Vec<Invocation>>,
}

impl FakeDrush {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, subcommand: &str, stdout: &str) -> Self {
        self.replies
            .insert(subcommand.to_string(), stdout.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Arguments after the global options, one string per call.
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.args[3..].join(" "))
            .collect()
    }
}

impl ProcessRunner for FakeDrush {
    fn run(
        &self,
        invocation: &Invocation,
        _cwd: &Path,
        _env: &HashMap<String, String>,
    ) -> Result<ProcessOutcome, DrushError> {
        self.calls.borrow_mut().push(invocation.clone());
        let stdout = self
            .replies
            .get(invocation.subcommand())
            .map(|s| s.as_bytes().to_vec())
            .unwrap_or_default();
        Ok(ProcessOutcome {
            code: Some(0),
            stdout,
        })
    }
}
