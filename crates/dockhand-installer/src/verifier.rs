use std::sync::Arc;

use dockhand_sequencer::StateVerifier;

use crate::runner::{CommandOutput, CommandRunner};

/// Post-rollback verifier that inspects the Docker daemon through the
/// command runner.
///
/// The snapshot is the set of running container ids. After rollback it
/// warns when containers are still running or when the observable state
/// drifted from the baseline; when the daemon is gone (the expected result
/// of a rolled-back installation) there is nothing to check.
pub struct EngineStateVerifier {
    runner: Arc<dyn CommandRunner>,
    baseline: Option<String>,
}

impl EngineStateVerifier {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            baseline: None,
        }
    }

    fn snapshot(&self) -> Option<String> {
        self.runner
            .run("docker", &["ps", "-q"])
            .ok()
            .filter(CommandOutput::success)
            .map(|output| output.stdout.trim().to_owned())
    }
}

impl StateVerifier for EngineStateVerifier {
    fn capture_baseline(&mut self) {
        self.baseline = self.snapshot();
    }

    fn verify(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let Some(current) = self.snapshot() else {
            return warnings;
        };
        if !current.is_empty() {
            warnings.push("Docker containers are still running after rollback".to_owned());
        }
        if self
            .baseline
            .as_ref()
            .is_some_and(|baseline| *baseline != current)
        {
            warnings
                .push("Docker state no longer matches the snapshot taken before the run".to_owned());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockCommandRunner;

    #[test]
    fn warns_when_containers_survive_the_rollback() {
        let runner = Arc::new(MockCommandRunner::new().with_stdout("docker", "abc123\n"));
        let mut verifier = EngineStateVerifier::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);

        let warnings = verifier.verify();

        assert_eq!(
            warnings,
            ["Docker containers are still running after rollback"]
        );
    }

    #[test]
    fn silent_when_the_daemon_is_gone() {
        let runner = Arc::new(MockCommandRunner::new().with_missing("docker"));
        let mut verifier = EngineStateVerifier::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);

        assert!(verifier.verify().is_empty());
    }

    #[test]
    fn silent_when_the_daemon_refuses_the_query() {
        let runner = Arc::new(MockCommandRunner::new().with_failure("docker", 1));
        let mut verifier = EngineStateVerifier::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);

        assert!(verifier.verify().is_empty());
    }

    #[test]
    fn warns_about_drift_from_the_baseline() {
        let runner = Arc::new(MockCommandRunner::new().with_stdout("docker", ""));
        let mut verifier = EngineStateVerifier::new(Arc::clone(&runner) as Arc<dyn CommandRunner>);
        verifier.capture_baseline();

        runner.set_stdout("docker", "abc123\n");
        let warnings = verifier.verify();

        assert!(
            warnings
                .iter()
                .any(|w| w.contains("no longer matches the snapshot"))
        );
    }
}
