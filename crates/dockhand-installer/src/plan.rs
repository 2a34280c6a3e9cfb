use std::sync::Arc;

use dockhand_sequencer::Step;
use tracing::debug;

use crate::error::InstallError;
use crate::platform::{LinuxDistro, Platform};
use crate::runner::CommandRunner;
use crate::steps::{
    BrewFormulaStep, ColimaStartStep, DesktopDownloadStep, DesktopInstallStep, EnableServiceStep,
    EnableWsl2Step, HomebrewInstallStep, InstallDesktopStep, InstallPackagesStep, VerifyEngineStep,
};

/// Which Docker delivery to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallFlavor {
    /// Docker Engine, with a lightweight VM runtime where one is needed.
    Engine,
    /// Docker Desktop.
    Desktop,
}

/// Caller-facing knobs for an installation.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub flavor: InstallFlavor,
    /// Add the invoking user to the `docker` group (Linux).
    pub add_user_to_group: bool,
    /// Bring the daemon up once the packages are in place.
    pub start_service: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            flavor: InstallFlavor::Engine,
            add_user_to_group: true,
            start_service: true,
        }
    }
}

type PlannedSteps = Vec<Box<dyn Step<Error = InstallError>>>;

/// Assembles the ordered step list for a platform.
///
/// Distribution detection happens here, at planning time, so steps never
/// pass state between each other.
pub struct InstallPlanner {
    runner: Arc<dyn CommandRunner>,
}

impl InstallPlanner {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    #[must_use]
    pub fn plan(&self, platform: Platform, options: &InstallOptions) -> PlannedSteps {
        match platform {
            Platform::Linux => self.plan_linux(options),
            Platform::MacOs => self.plan_macos(options),
            Platform::Windows => self.plan_windows(),
        }
    }

    // Linux always provisions the engine; Desktop has no install path here.
    fn plan_linux(&self, options: &InstallOptions) -> PlannedSteps {
        let distro = LinuxDistro::detect();
        debug!(?distro, "planning Linux installation");
        let mut steps: PlannedSteps = vec![Box::new(InstallPackagesStep::new(
            distro,
            options.add_user_to_group,
            Arc::clone(&self.runner),
        ))];
        if options.start_service {
            steps.push(Box::new(EnableServiceStep::new(Arc::clone(&self.runner))));
        }
        steps.push(Box::new(VerifyEngineStep::new(
            Arc::clone(&self.runner),
            true,
        )));
        steps
    }

    fn plan_macos(&self, options: &InstallOptions) -> PlannedSteps {
        let mut steps: PlannedSteps = Vec::new();
        match options.flavor {
            InstallFlavor::Engine => {
                steps.push(Box::new(HomebrewInstallStep::new(Arc::clone(&self.runner))));
                steps.push(Box::new(BrewFormulaStep::new(
                    "docker",
                    Arc::clone(&self.runner),
                )));
                steps.push(Box::new(BrewFormulaStep::new(
                    "colima",
                    Arc::clone(&self.runner),
                )));
                if options.start_service {
                    steps.push(Box::new(ColimaStartStep::new(Arc::clone(&self.runner))));
                }
            }
            InstallFlavor::Desktop => {
                let image = std::env::temp_dir().join("Docker.dmg");
                steps.push(Box::new(DesktopDownloadStep::new(
                    image.clone(),
                    Arc::clone(&self.runner),
                )));
                steps.push(Box::new(DesktopInstallStep::new(
                    image,
                    Arc::clone(&self.runner),
                )));
            }
        }
        steps.push(Box::new(VerifyEngineStep::new(
            Arc::clone(&self.runner),
            false,
        )));
        steps
    }

    fn plan_windows(&self) -> PlannedSteps {
        let installer = std::env::temp_dir().join("DockerDesktopInstaller.exe");
        vec![
            Box::new(EnableWsl2Step::new(Arc::clone(&self.runner))),
            Box::new(InstallDesktopStep::new(
                installer,
                Arc::clone(&self.runner),
            )),
            Box::new(VerifyEngineStep::new(Arc::clone(&self.runner), false)),
        ]
    }
}
