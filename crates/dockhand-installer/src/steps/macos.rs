use std::path::PathBuf;
use std::sync::Arc;

use dockhand_sequencer::{Step, StepContext};
use tracing::debug;

use crate::error::{InstallError, Result};
use crate::runner::CommandRunner;

const HOMEBREW_INSTALL: &str =
    "curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh | /bin/bash";

const DESKTOP_DMG_URL: &str = "https://desktop.docker.com/mac/main/amd64/Docker.dmg";

/// Makes sure Homebrew is available, installing it when absent.
///
/// Rollback only removes Homebrew when this run installed it; a
/// pre-existing installation is left alone.
pub struct HomebrewInstallStep {
    runner: Arc<dyn CommandRunner>,
    installed_by_us: bool,
}

impl HomebrewInstallStep {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            installed_by_us: false,
        }
    }
}

impl Step for HomebrewInstallStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Installing Homebrew"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if self.runner.run("which", &["brew"])?.success() {
            ctx.log("Homebrew is already installed");
            return Ok(());
        }

        ctx.log("Installing Homebrew...");
        self.runner.stream("/bin/bash", &["-c", HOMEBREW_INSTALL], ctx)?;
        self.installed_by_us = true;
        Ok(())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        if !self.installed_by_us {
            ctx.log("Skipping Homebrew rollback: it was not installed by this run");
            return Ok(());
        }
        ctx.log("Rolling back Homebrew installation...");
        self.runner.run("brew", &["uninstall", "--force", "brew"])?;
        Ok(())
    }
}

/// Installs a single Homebrew formula; rollback uninstalls it.
pub struct BrewFormulaStep {
    formula: String,
    description: String,
    runner: Arc<dyn CommandRunner>,
}

impl BrewFormulaStep {
    #[must_use]
    pub fn new(formula: &str, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            formula: formula.to_owned(),
            description: format!("Installing {formula}"),
            runner,
        }
    }
}

impl Step for BrewFormulaStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log(&format!("Installing {}...", self.formula));
        self.runner.run_checked("brew", &["install", &self.formula])?;
        Ok(())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log(&format!("Uninstalling {}...", self.formula));
        self.runner.run("brew", &["uninstall", &self.formula])?;
        Ok(())
    }
}

/// Starts Colima and configures it to come up on login.
pub struct ColimaStartStep {
    runner: Arc<dyn CommandRunner>,
}

impl ColimaStartStep {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Step for ColimaStartStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Starting Colima"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Starting Colima...");
        self.runner.run_checked("colima", &["start"])?;
        ctx.log("Configuring Colima auto-start...");
        self.runner.run_checked("brew", &["services", "start", "colima"])?;
        Ok(())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Stopping Colima...");
        self.runner.run("brew", &["services", "stop", "colima"])?;
        self.runner.run("colima", &["stop"])?;
        Ok(())
    }
}

/// Downloads the Docker Desktop disk image to a scratch path.
///
/// The image is a build artifact of the run, not a deliverable: it is
/// registered with the resource registry and removed during cleanup.
pub struct DesktopDownloadStep {
    image_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl DesktopDownloadStep {
    #[must_use]
    pub fn new(image_path: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self { image_path, runner }
    }
}

impl Step for DesktopDownloadStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Downloading Docker Desktop"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Downloading Docker Desktop image...");
        ctx.resources().register(&self.image_path);
        let dest = self.image_path.to_string_lossy().into_owned();
        debug!(dest = %dest, url = DESKTOP_DMG_URL, "downloading disk image");
        self.runner
            .stream("curl", &["-L", "-o", &dest, DESKTOP_DMG_URL], ctx)
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        // Cleanup would remove the image too; rollback does it eagerly.
        if self.image_path.exists() {
            ctx.log("Removing downloaded Docker Desktop image...");
            std::fs::remove_file(&self.image_path).map_err(|source| {
                InstallError::FileRemove {
                    path: self.image_path.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }
}

/// Mounts the downloaded image and copies Docker Desktop into
/// `/Applications`.
pub struct DesktopInstallStep {
    image_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl DesktopInstallStep {
    #[must_use]
    pub fn new(image_path: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self { image_path, runner }
    }
}

impl Step for DesktopInstallStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Installing Docker Desktop"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let image = self.image_path.to_string_lossy().into_owned();
        ctx.log("Mounting Docker Desktop image...");
        self.runner.run_checked("hdiutil", &["attach", &image])?;
        ctx.log("Copying Docker.app into /Applications...");
        let copied = self
            .runner
            .run_checked("sudo", &["cp", "-R", "/Volumes/Docker/Docker.app", "/Applications"]);
        // Unmount no matter how the copy went.
        self.runner.run("hdiutil", &["detach", "/Volumes/Docker"])?;
        copied.map(|_| ())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Removing Docker Desktop from /Applications...");
        self.runner
            .run("sudo", &["rm", "-rf", "/Applications/Docker.app"])?;
        Ok(())
    }
}
