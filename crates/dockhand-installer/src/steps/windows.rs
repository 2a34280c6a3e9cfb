use std::path::PathBuf;
use std::sync::Arc;

use dockhand_sequencer::{Step, StepContext};
use tracing::debug;

use crate::error::{InstallError, Result};
use crate::runner::CommandRunner;

const DESKTOP_INSTALLER_URL: &str =
    "https://desktop.docker.com/win/main/amd64/Docker%20Desktop%20Installer.exe";

/// Enables the Windows features Docker Desktop depends on (WSL2 and the
/// virtual machine platform).
///
/// When WSL2 was already enabled before the run, there is nothing to
/// enable and nothing to undo.
pub struct EnableWsl2Step {
    runner: Arc<dyn CommandRunner>,
    was_present: bool,
}

impl EnableWsl2Step {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            was_present: false,
        }
    }
}

impl Step for EnableWsl2Step {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Configuring WSL2"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let status = self.runner.run("wsl", &["--status"])?;
        self.was_present = status.stdout.contains("WSL 2") || status.stderr.contains("WSL 2");
        if self.was_present {
            ctx.log("WSL2 is already enabled");
            return Ok(());
        }

        ctx.log("Enabling WSL2...");
        self.runner.run_checked(
            "dism.exe",
            &[
                "/online",
                "/enable-feature",
                "/featurename:Microsoft-Windows-Subsystem-Linux",
                "/all",
                "/norestart",
            ],
        )?;
        self.runner.run_checked(
            "dism.exe",
            &[
                "/online",
                "/enable-feature",
                "/featurename:VirtualMachinePlatform",
                "/all",
                "/norestart",
            ],
        )?;
        self.runner
            .run_checked("wsl", &["--set-default-version", "2"])?;
        Ok(())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if self.was_present {
            ctx.log("Skipping WSL2 rollback: it was already enabled");
            return Ok(());
        }
        ctx.log("Disabling WSL2 features...");
        self.runner.run(
            "dism.exe",
            &[
                "/online",
                "/disable-feature",
                "/featurename:Microsoft-Windows-Subsystem-Linux",
                "/norestart",
            ],
        )?;
        self.runner.run(
            "dism.exe",
            &[
                "/online",
                "/disable-feature",
                "/featurename:VirtualMachinePlatform",
                "/norestart",
            ],
        )?;
        Ok(())
    }
}

/// Downloads the Docker Desktop installer to a scratch path and runs it
/// silently; rollback drives the same installer's uninstall mode.
pub struct InstallDesktopStep {
    installer_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl InstallDesktopStep {
    #[must_use]
    pub fn new(installer_path: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            installer_path,
            runner,
        }
    }
}

impl Step for InstallDesktopStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Installing Docker Desktop"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Downloading Docker Desktop installer...");
        ctx.resources().register(&self.installer_path);
        let installer = self.installer_path.to_string_lossy().into_owned();
        debug!(dest = %installer, url = DESKTOP_INSTALLER_URL, "downloading installer");
        self.runner
            .stream("curl", &["-L", "-o", &installer, DESKTOP_INSTALLER_URL], ctx)?;

        ctx.log("Running Docker Desktop installer...");
        self.runner
            .run_checked(&installer, &["install", "--quiet", "--accept-license"])?;
        Ok(())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Uninstalling Docker Desktop...");
        let installer = self.installer_path.to_string_lossy().into_owned();
        self.runner.run(&installer, &["uninstall", "--quiet"])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockCommandRunner, RecordingReporter};
    use dockhand_sequencer::{CancelToken, ResourceRegistry};

    #[test]
    fn wsl2_step_does_nothing_when_already_enabled() {
        let runner = Arc::new(MockCommandRunner::new().with_stdout("wsl", "WSL 2 is running"));
        let reporter = RecordingReporter::default();
        let cancel = CancelToken::new();
        let resources = ResourceRegistry::new();
        let ctx = StepContext::new(&reporter, &cancel, &resources);

        let mut step = EnableWsl2Step::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        step.execute(&ctx).expect("execute step");

        assert_eq!(runner.invocations(), ["wsl --status"]);

        step.rollback(&ctx).expect("rollback step");
        assert_eq!(runner.invocations().len(), 1, "nothing to disable");
    }

    #[test]
    fn wsl2_step_enables_both_features_when_absent() {
        let runner = Arc::new(MockCommandRunner::new().with_stdout("wsl", "not installed"));
        let reporter = RecordingReporter::default();
        let cancel = CancelToken::new();
        let resources = ResourceRegistry::new();
        let ctx = StepContext::new(&reporter, &cancel, &resources);

        let mut step = EnableWsl2Step::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        step.execute(&ctx).expect("execute step");

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 4, "status check plus three setup commands");
        assert!(invocations[1].contains("/enable-feature"));
        assert!(invocations[3].contains("--set-default-version 2"));

        step.rollback(&ctx).expect("rollback step");
        let invocations = runner.invocations();
        assert!(invocations[4].contains("/disable-feature"));
        assert!(invocations[5].contains("VirtualMachinePlatform"));
    }

    #[test]
    fn desktop_step_downloads_then_installs_silently() {
        let runner = Arc::new(MockCommandRunner::new());
        let reporter = RecordingReporter::default();
        let cancel = CancelToken::new();
        let resources = ResourceRegistry::new();
        let ctx = StepContext::new(&reporter, &cancel, &resources);

        let installer = std::env::temp_dir().join("dockhand-test-installer.exe");
        let mut step =
            InstallDesktopStep::new(installer.clone(), Arc::clone(&runner) as Arc<dyn CommandRunner>);
        step.execute(&ctx).expect("execute step");

        assert_eq!(resources.registered(), [installer]);
        let invocations = runner.invocations();
        assert!(invocations[0].starts_with("curl -L -o"));
        assert!(invocations[1].ends_with("install --quiet --accept-license"));
    }
}
