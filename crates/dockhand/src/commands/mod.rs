mod install;
mod plan;

use clap::{Args, Subcommand};
use dockhand_installer::{InstallFlavor, InstallOptions};

use crate::error::Result;

#[derive(Subcommand)]
pub enum Commands {
    /// Install a Docker runtime on this machine
    Install(InstallArgs),
    /// Show the steps an installation would run, without changing anything
    Plan(PlanArgs),
}

#[derive(Args)]
pub struct OptionArgs {
    /// Provision Docker Desktop instead of the plain engine
    #[arg(long)]
    pub desktop: bool,

    /// Do not enable or start the daemon after installing
    #[arg(long)]
    pub no_service: bool,

    /// Do not add the current user to the docker group (Linux)
    #[arg(long)]
    pub no_group: bool,
}

impl OptionArgs {
    pub fn to_options(&self) -> InstallOptions {
        InstallOptions {
            flavor: if self.desktop {
                InstallFlavor::Desktop
            } else {
                InstallFlavor::Engine
            },
            add_user_to_group: !self.no_group,
            start_service: !self.no_service,
        }
    }
}

#[derive(Args)]
pub struct InstallArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    #[command(flatten)]
    pub options: OptionArgs,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub options: OptionArgs,
}

impl Commands {
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Install(args) => install::run(&args),
            Self::Plan(args) => plan::run(&args),
        }
    }
}
