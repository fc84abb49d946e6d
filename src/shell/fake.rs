//! Scripted [`ScriptRunner`] for tests.
//!
//! `FakeScriptRunner` returns canned results per script name and records
//! every call so tests can assert on the exact arguments.
//!
//! # Example
//!
//! ```
//! use monitorkit::shell::{FakeScriptRunner, ScriptRunner};
//!
//! let mut runner = FakeScriptRunner::new();
//! runner.fail("apm.sh", 2, "no php found");
//!
//! assert!(runner.run("infrastructure.sh", &[]).unwrap().success());
//! assert_eq!(runner.run("apm.sh", &[]).unwrap().exit_code, Some(2));
//! assert_eq!(runner.calls().len(), 2);
//! ```

use std::collections::HashMap;

use super::command::{ScriptOutput, ScriptRunner};
use crate::error::{MonitorkitError, Result};

/// A single recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub script: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
enum Canned {
    Output(ScriptOutput),
    TimedOut,
}

/// Runner that never touches the filesystem.
///
/// Unconfigured scripts succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeScriptRunner {
    responses: HashMap<String, Canned>,
    calls: Vec<RecordedCall>,
}

impl FakeScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `script` exit with `code`, printing `stderr`.
    pub fn fail(&mut self, script: &str, code: i32, stderr: &str) {
        let output = ScriptOutput {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        };
        self.respond(script, output);
    }

    /// Set the full result for `script`.
    pub fn respond(&mut self, script: &str, output: ScriptOutput) {
        self.responses
            .insert(script.to_string(), Canned::Output(output));
    }

    /// Make `script` behave as if it hit the runner's timeout.
    pub fn time_out(&mut self, script: &str) {
        self.responses.insert(script.to_string(), Canned::TimedOut);
    }

    /// All calls, in order.
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Calls made to one script, in order.
    pub fn calls_to(&self, script: &str) -> Vec<&RecordedCall> {
        self.calls.iter().filter(|c| c.script == script).collect()
    }
}

impl ScriptRunner for FakeScriptRunner {
    fn run(&mut self, script: &str, args: &[String]) -> Result<ScriptOutput> {
        self.calls.push(RecordedCall {
            script: script.to_string(),
            args: args.to_vec(),
        });

        match self.responses.get(script) {
            Some(Canned::Output(output)) => Ok(output.clone()),
            Some(Canned::TimedOut) => Err(MonitorkitError::ScriptTimedOut {
                script: script.to_string(),
                seconds: 0,
            }),
            None => Ok(ScriptOutput::with_code(0)),
        }
    }
}
