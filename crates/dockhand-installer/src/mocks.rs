//! Scriptable test doubles for the command runner and the reporter.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Mutex, PoisonError};

use dockhand_sequencer::{Reporter, StepContext};

use crate::error::{InstallError, Result};
use crate::runner::{CommandOutput, CommandRunner, render_command};

/// Command runner that records every invocation and answers from canned
/// results instead of touching the host system.
#[derive(Default)]
pub struct MockCommandRunner {
    invocations: Mutex<Vec<String>>,
    failures: HashMap<String, i32>,
    missing: HashSet<String>,
    stdout: Mutex<HashMap<String, String>>,
}

impl MockCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with `code`.
    #[must_use]
    pub fn with_failure(mut self, program: &str, code: i32) -> Self {
        self.failures.insert(program.to_owned(), code);
        self
    }

    /// Make `program` fail to launch, as if it were not installed.
    #[must_use]
    pub fn with_missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_owned());
        self
    }

    /// Canned stdout for every invocation of `program`.
    #[must_use]
    pub fn with_stdout(self, program: &str, stdout: &str) -> Self {
        self.set_stdout(program, stdout);
        self
    }

    /// Change the canned stdout mid-test.
    pub fn set_stdout(&self, program: &str, stdout: &str) {
        self.stdout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(program.to_owned(), stdout.to_owned());
    }

    /// Every command issued so far, rendered as `program arg arg...`.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, program: &str, args: &[&str]) {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(render_command(program, args));
    }

    fn canned_stdout(&self, program: &str) -> String {
        self.stdout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(program)
            .cloned()
            .unwrap_or_default()
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.record(program, args);
        if self.missing.contains(program) {
            return Err(InstallError::CommandLaunch {
                program: program.to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "mocked as missing"),
            });
        }
        let code = self.failures.get(program).copied().unwrap_or(0);
        Ok(CommandOutput {
            code: Some(code),
            stdout: self.canned_stdout(program),
            stderr: String::new(),
        })
    }

    fn stream(&self, program: &str, args: &[&str], ctx: &StepContext<'_>) -> Result<()> {
        self.record(program, args);
        if self.missing.contains(program) {
            return Err(InstallError::CommandLaunch {
                program: program.to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "mocked as missing"),
            });
        }
        if let Some(&code) = self.failures.get(program) {
            if code != 0 {
                return Err(InstallError::CommandFailed {
                    command: render_command(program, args),
                    code,
                    stderr: String::new(),
                });
            }
        }
        for line in self.canned_stdout(program).lines() {
            ctx.log(line);
        }
        Ok(())
    }
}

/// Reporter that keeps every log line for assertions.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Reporter for RecordingReporter {
    fn log_message(&self, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
    }

    fn progress_updated(&self, _percent: u8, _text: &str) {}
}
