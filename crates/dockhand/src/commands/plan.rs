use std::sync::Arc;

use dockhand_installer::{CommandRunner, InstallPlanner, Platform, SystemCommandRunner};

use super::PlanArgs;
use crate::error::Result;

pub(crate) fn run(args: &PlanArgs) -> Result<()> {
    let platform = Platform::current()?;
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    let planner = InstallPlanner::new(runner);

    let steps = planner.plan(platform, &args.options.to_options());

    println!("Planned installation steps for {}:", platform.label());
    for (index, step) in steps.iter().enumerate() {
        println!("  {}. {}", index + 1, step.description());
    }
    println!("\nRun `dockhand install` to apply them.");

    Ok(())
}
