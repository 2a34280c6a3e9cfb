//! Concrete installation steps, grouped per platform.

mod linux;
mod macos;
mod verify;
mod windows;

pub use linux::{EnableServiceStep, InstallPackagesStep};
pub use macos::{BrewFormulaStep, ColimaStartStep, DesktopDownloadStep, DesktopInstallStep, HomebrewInstallStep};
pub use verify::VerifyEngineStep;
pub use windows::{EnableWsl2Step, InstallDesktopStep};
