use std::sync::Arc;

use dockhand_sequencer::{Step, StepContext};

use crate::error::{InstallError, Result};
use crate::runner::CommandRunner;

/// Asks the freshly installed engine for its version.
///
/// A failing check is advisory: it is logged with a hint about restarting,
/// since group membership and service startup often need a new session to
/// take effect. There is no lasting effect to undo, so the default no-op
/// rollback applies.
pub struct VerifyEngineStep {
    runner: Arc<dyn CommandRunner>,
    use_sudo: bool,
}

impl VerifyEngineStep {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, use_sudo: bool) -> Self {
        Self { runner, use_sudo }
    }
}

impl Step for VerifyEngineStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Verifying Docker installation"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Verifying Docker installation...");
        let result = if self.use_sudo {
            self.runner.run_checked("sudo", &["docker", "--version"])
        } else {
            self.runner.run_checked("docker", &["--version"])
        };

        match result {
            Ok(output) => {
                ctx.log(&format!("Docker verified: {}", output.stdout.trim()));
            }
            Err(error) => {
                ctx.log(&format!("WARNING: Docker verification failed: {error}"));
                ctx.log("A restart or a fresh login session may be required to finish the installation.");
            }
        }
        Ok(())
    }
}
