use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use dockhand_sequencer::StepContext;

use crate::error::{InstallError, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes external programs on behalf of installation steps.
///
/// Steps only ever observe commands succeeding or failing; swapping this
/// provider for a scripted mock keeps every step testable without touching
/// the host system.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing its output.
    ///
    /// A nonzero exit is not an error at this level; see
    /// [`CommandRunner::run_checked`]. Rollback paths use this directly so
    /// a refusing command does not abort the remaining undo work.
    ///
    /// # Errors
    ///
    /// Returns an error when the program cannot be launched.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command, forwarding each stdout line to the reporter and
    /// polling the cancellation token between lines.
    ///
    /// # Errors
    ///
    /// Returns an error when the program cannot be launched, exits
    /// unsuccessfully, or cancellation is requested mid-stream (the child
    /// process is killed first).
    fn stream(&self, program: &str, args: &[&str], ctx: &StepContext<'_>) -> Result<()>;

    /// Like [`CommandRunner::run`], but a nonzero exit becomes an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the program cannot be launched or exits with
    /// a nonzero status.
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(program, args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(InstallError::CommandFailed {
                command: render_command(program, args),
                code: output.code.unwrap_or(-1),
                stderr: output.stderr.trim().to_owned(),
            })
        }
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| InstallError::CommandLaunch {
                program: program.to_owned(),
                source,
            })?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn stream(&self, program: &str, args: &[&str], ctx: &StepContext<'_>) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InstallError::CommandLaunch {
                program: program.to_owned(),
                source,
            })?;

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                ctx.log(line.trim_end());
                if ctx.cancel_token().is_cancelled() {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(InstallError::Cancelled);
                }
            }
        }

        let status = child.wait().map_err(|source| InstallError::CommandLaunch {
            program: program.to_owned(),
            source,
        })?;
        if status.success() {
            return Ok(());
        }

        let mut stderr = String::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        Err(InstallError::CommandFailed {
            command: render_command(program, args),
            code: status.code().unwrap_or(-1),
            stderr: stderr.trim().to_owned(),
        })
    }
}

pub(crate) fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_owned()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_program_and_args() {
        assert_eq!(
            render_command("systemctl", &["enable", "docker"]),
            "systemctl enable docker"
        );
        assert_eq!(render_command("docker", &[]), "docker");
    }

    #[test]
    fn run_reports_missing_programs_as_launch_errors() {
        let runner = SystemCommandRunner::new();

        let result = runner.run("dockhand-no-such-program", &[]);

        assert!(matches!(
            result,
            Err(InstallError::CommandLaunch { program, .. }) if program == "dockhand-no-such-program"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_exit_code_and_output() {
        let runner = SystemCommandRunner::new();

        let output = runner
            .run("sh", &["-c", "echo out; echo err >&2; exit 3"])
            .expect("launch sh");

        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_turns_nonzero_exit_into_an_error() {
        let runner = SystemCommandRunner::new();

        let result = runner.run_checked("sh", &["-c", "exit 2"]);

        assert!(matches!(
            result,
            Err(InstallError::CommandFailed { code: 2, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn stream_forwards_lines_to_the_reporter() {
        use dockhand_sequencer::{CancelToken, Reporter, ResourceRegistry};
        use std::sync::{Mutex, PoisonError};

        #[derive(Default)]
        struct Capture {
            lines: Mutex<Vec<String>>,
        }

        impl Reporter for Capture {
            fn log_message(&self, text: &str) {
                self.lines
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(text.to_owned());
            }

            fn progress_updated(&self, _percent: u8, _text: &str) {}
        }

        let reporter = Capture::default();
        let cancel = CancelToken::new();
        let resources = ResourceRegistry::new();
        let ctx = StepContext::new(&reporter, &cancel, &resources);

        let runner = SystemCommandRunner::new();
        runner
            .stream("sh", &["-c", "echo one; echo two"], &ctx)
            .expect("stream sh");

        let lines = reporter
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        assert_eq!(lines, ["one", "two"]);
    }
}
