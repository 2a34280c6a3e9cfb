use std::sync::Arc;

use dialoguer::Confirm;
use dockhand_installer::{
    CommandRunner, EngineStateVerifier, InstallPlanner, Platform, SystemCommandRunner,
};
use dockhand_sequencer::{CancelToken, Operation, Reporter};

use super::InstallArgs;
use crate::error::{CliError, Result};
use crate::reporter::ConsoleReporter;

pub(crate) fn run(args: &InstallArgs) -> Result<()> {
    let platform = Platform::current()?;
    let options = args.options.to_options();

    if !args.yes && !confirm(platform)? {
        println!("Installation aborted.");
        return Ok(());
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    let planner = InstallPlanner::new(Arc::clone(&runner));

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter);
    let mut operation = Operation::new(reporter, CancelToken::new());
    operation.set_verifier(Box::new(EngineStateVerifier::new(Arc::clone(&runner))));
    for step in planner.plan(platform, &options) {
        operation.add_boxed_step(step);
    }

    // The sequencer runs on its own worker; all progress arrives through
    // the console reporter while we wait.
    let handle = operation.spawn()?;
    let outcome = handle.join();

    println!("{}", outcome.message());
    if outcome.success() {
        Ok(())
    } else {
        Err(CliError::InstallFailed)
    }
}

fn confirm(platform: Platform) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!(
            "This will install Docker on this {} machine. Continue?",
            platform.label()
        ))
        .default(false)
        .interact()
        .map_err(|e| match e {
            dialoguer::Error::IO(io_err) => CliError::Io(io_err),
        })
}
