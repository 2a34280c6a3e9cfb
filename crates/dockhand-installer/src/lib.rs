//! Docker runtime provisioning on top of the `dockhand-sequencer` core.
//!
//! This crate supplies the concrete installation steps (package install,
//! service start, Desktop download, WSL2 setup, verification), the command
//! execution provider they shell out through, platform and distribution
//! detection, and the planner that assembles an ordered step list per
//! platform.

mod error;
mod plan;
mod platform;
mod runner;
mod steps;
mod verifier;

#[cfg(test)]
pub mod mocks;

pub use error::{InstallError, Result};
pub use plan::{InstallFlavor, InstallOptions, InstallPlanner};
pub use platform::{LinuxDistro, Platform};
pub use runner::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use steps::{
    BrewFormulaStep, ColimaStartStep, DesktopDownloadStep, DesktopInstallStep, EnableServiceStep,
    EnableWsl2Step, HomebrewInstallStep, InstallDesktopStep, InstallPackagesStep, VerifyEngineStep,
};
pub use verifier::EngineStateVerifier;
