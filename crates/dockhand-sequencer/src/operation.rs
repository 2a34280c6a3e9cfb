use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::cancel::CancelToken;
use crate::reporter::Reporter;
use crate::resources::ResourceRegistry;
use crate::step::{Step, StepContext};
use crate::verify::StateVerifier;

/// Final result of [`Operation::execute`].
///
/// Only a step failure or a cancellation request can produce a
/// non-successful outcome; rollback, cleanup and verification problems are
/// reported as warnings and never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Every step completed.
    Completed,
    /// A step failed; completed steps were rolled back.
    Failed {
        /// Message from the failing step.
        message: String,
    },
    /// Cancellation was requested; completed steps were rolled back.
    Cancelled,
}

impl OperationOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// User-facing summary of the run.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Completed => "Operation completed successfully".to_owned(),
            Self::Failed { message } => format!("Operation failed: {message}"),
            Self::Cancelled => "Operation cancelled by user".to_owned(),
        }
    }
}

/// Lifecycle of a run: `Pending -> Running -> RollingBack (on failure or
/// cancellation) -> CleaningUp -> Done`. `Done` is terminal; `execute`
/// consumes the operation, so there is no re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Running,
    RollingBack,
    CleaningUp,
    Done,
}

struct StepEntry<E> {
    step: Box<dyn Step<Error = E>>,
    completed: bool,
}

/// An ordered sequence of fallible, partially reversible steps.
///
/// Steps run strictly one after another on the thread that calls
/// [`Operation::execute`] (or on the worker spawned by
/// [`Operation::spawn`]); later steps may depend on the side effects of
/// earlier ones. On failure or cancellation, completed steps are rolled
/// back in reverse completion order on a best-effort basis. Registered
/// scratch resources are removed once per run, no matter how it ended.
///
/// An operation is single-use: populate it, execute it, discard it.
pub struct Operation<E> {
    steps: Vec<StepEntry<E>>,
    completed: Vec<usize>,
    resources: ResourceRegistry,
    reporter: Arc<dyn Reporter>,
    cancel: CancelToken,
    verifier: Option<Box<dyn StateVerifier>>,
    phase: Phase,
}

impl<E: Display> Operation<E> {
    #[must_use]
    pub fn new(reporter: Arc<dyn Reporter>, cancel: CancelToken) -> Self {
        Self {
            steps: Vec::new(),
            completed: Vec::new(),
            resources: ResourceRegistry::new(),
            reporter,
            cancel,
            verifier: None,
            phase: Phase::Pending,
        }
    }

    /// Append a step to the end of the sequence.
    pub fn add_step<S>(&mut self, step: S)
    where
        S: Step<Error = E> + 'static,
    {
        self.add_boxed_step(Box::new(step));
    }

    /// Append an already boxed step, e.g. one produced by a planner.
    pub fn add_boxed_step(&mut self, step: Box<dyn Step<Error = E>>) {
        self.steps.push(StepEntry {
            step,
            completed: false,
        });
    }

    /// Record a scratch artifact for unconditional removal after the run.
    /// Steps register their own artifacts through
    /// [`StepContext::resources`].
    pub fn register_resource(&self, path: impl Into<PathBuf>) {
        self.resources.register(path);
    }

    /// Attach a post-rollback state verifier.
    pub fn set_verifier(&mut self, verifier: Box<dyn StateVerifier>) {
        self.verifier = Some(verifier);
    }

    /// A clone of the token this operation polls between steps.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every step in declared order, rolling back on failure or
    /// cancellation.
    ///
    /// Cleanup of registered resources runs exactly once per call, on every
    /// path out of the step loop, after any rollback has finished.
    #[must_use]
    pub fn execute(mut self) -> OperationOutcome {
        self.set_phase(Phase::Running);
        if let Some(verifier) = self.verifier.as_mut() {
            verifier.capture_baseline();
        }
        let outcome = self.run_steps();
        self.set_phase(Phase::CleaningUp);
        self.resources.dispose_all(self.reporter.as_ref());
        self.set_phase(Phase::Done);
        outcome
    }

    fn run_steps(&mut self) -> OperationOutcome {
        let total = self.steps.len();
        for index in 0..total {
            if self.cancel.is_cancelled() {
                self.reporter.log_message("Operation cancelled by user.");
                self.roll_back();
                return OperationOutcome::Cancelled;
            }

            let description = self.steps[index].step.description().to_owned();
            self.reporter.progress_updated(
                progress_percent(index, total),
                &format!("Executing: {description}"),
            );
            self.reporter
                .log_message(&format!("Executing step: {description}"));

            let executed = {
                let ctx = StepContext::new(self.reporter.as_ref(), &self.cancel, &self.resources);
                let entry = &mut self.steps[index];
                if let Err(error) = entry.step.check_prerequisites(&ctx) {
                    ctx.log(&format!(
                        "Warning: prerequisite check failed for {description}: {error}"
                    ));
                }
                match entry.step.execute(&ctx) {
                    Ok(()) => {
                        entry.completed = true;
                        if let Err(error) = entry.step.verify_completion(&ctx) {
                            ctx.log(&format!(
                                "Warning: completion check failed for {description}: {error}"
                            ));
                        }
                        Ok(())
                    }
                    Err(error) => Err(error),
                }
            };

            match executed {
                Ok(()) => self.completed.push(index),
                Err(error) => {
                    self.reporter.log_message(&format!("ERROR: {error}"));
                    self.roll_back();
                    return OperationOutcome::Failed {
                        message: error.to_string(),
                    };
                }
            }
        }
        OperationOutcome::Completed
    }

    /// Undo completed steps, last-completed first. A rollback that fails is
    /// reported as a warning and the loop keeps going; afterwards the state
    /// verifier runs regardless of how many rollbacks succeeded.
    fn roll_back(&mut self) {
        self.set_phase(Phase::RollingBack);
        self.reporter.log_message("Rolling back operation...");
        let order: Vec<usize> = self.completed.iter().rev().copied().collect();
        let total = order.len();
        for (position, index) in order.into_iter().enumerate() {
            let description = self.steps[index].step.description().to_owned();
            self.reporter.progress_updated(
                progress_percent(position, total),
                &format!("Rolling back: {description}"),
            );
            self.reporter
                .log_message(&format!("Rolling back step: {description}"));
            let ctx = StepContext::new(self.reporter.as_ref(), &self.cancel, &self.resources);
            if let Err(error) = self.steps[index].step.rollback(&ctx) {
                self.reporter.log_message(&format!(
                    "Warning: Error during rollback of {description}: {error}"
                ));
            }
        }
        self.verify_state();
    }

    fn verify_state(&mut self) {
        let Some(verifier) = self.verifier.as_mut() else {
            return;
        };
        self.reporter
            .log_message("Verifying system state after rollback...");
        for warning in verifier.verify() {
            self.reporter.log_message(&format!("Warning: {warning}"));
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "operation phase change");
        self.phase = phase;
    }
}

impl<E> Operation<E>
where
    E: Display + Send + 'static,
{
    /// Run the operation on a dedicated worker thread so the caller is
    /// never blocked; progress keeps flowing through the reporter.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<OperationHandle> {
        let cancel = self.cancel.clone();
        let thread = thread::Builder::new()
            .name("dockhand-operation".to_owned())
            .spawn(move || self.execute())?;
        Ok(OperationHandle { cancel, thread })
    }
}

/// Handle to an operation running on a background worker thread.
pub struct OperationHandle {
    cancel: CancelToken,
    thread: JoinHandle<OperationOutcome>,
}

impl OperationHandle {
    /// Token shared with the running operation.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cooperative cancellation of the running operation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker to finish and return the outcome.
    #[must_use]
    pub fn join(self) -> OperationOutcome {
        self.thread
            .join()
            .unwrap_or_else(|_| OperationOutcome::Failed {
                message: "operation worker thread panicked".to_owned(),
            })
    }
}

fn progress_percent(position: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(position.saturating_mul(100) / total).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::reporter::NullReporter;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(String);

    #[derive(Default)]
    struct EventLog {
        events: Mutex<Vec<String>>,
    }

    impl EventLog {
        fn push(&self, event: impl Into<String>) {
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(event.into());
        }

        fn snapshot(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    struct RecordingStep {
        name: &'static str,
        events: Arc<EventLog>,
        fail_with: Option<&'static str>,
    }

    impl RecordingStep {
        fn ok(name: &'static str, events: &Arc<EventLog>) -> Self {
            Self {
                name,
                events: Arc::clone(events),
                fail_with: None,
            }
        }

        fn failing(name: &'static str, events: &Arc<EventLog>, message: &'static str) -> Self {
            Self {
                name,
                events: Arc::clone(events),
                fail_with: Some(message),
            }
        }
    }

    impl Step for RecordingStep {
        type Error = TestError;

        fn description(&self) -> &str {
            self.name
        }

        fn execute(&mut self, _ctx: &StepContext<'_>) -> Result<(), Self::Error> {
            self.events.push(format!("execute {}", self.name));
            match self.fail_with {
                Some(message) => Err(TestError(message.to_owned())),
                None => Ok(()),
            }
        }

        fn rollback(&mut self, _ctx: &StepContext<'_>) -> Result<(), Self::Error> {
            self.events.push(format!("rollback {}", self.name));
            Ok(())
        }
    }

    fn operation() -> Operation<TestError> {
        Operation::new(Arc::new(NullReporter), CancelToken::new())
    }

    #[test]
    fn all_steps_run_in_declared_order() {
        let events = Arc::new(EventLog::default());
        let mut op = operation();
        op.add_step(RecordingStep::ok("a", &events));
        op.add_step(RecordingStep::ok("b", &events));
        op.add_step(RecordingStep::ok("c", &events));

        let outcome = op.execute();

        assert_eq!(outcome, OperationOutcome::Completed);
        assert_eq!(outcome.message(), "Operation completed successfully");
        assert_eq!(events.snapshot(), ["execute a", "execute b", "execute c"]);
    }

    #[test]
    fn failure_rolls_back_the_completed_prefix_in_reverse() {
        let events = Arc::new(EventLog::default());
        let mut op = operation();
        op.add_step(RecordingStep::ok("a", &events));
        op.add_step(RecordingStep::ok("b", &events));
        op.add_step(RecordingStep::failing("c", &events, "disk full"));
        op.add_step(RecordingStep::ok("d", &events));

        let outcome = op.execute();

        assert_eq!(outcome.message(), "Operation failed: disk full");
        assert_eq!(
            events.snapshot(),
            [
                "execute a",
                "execute b",
                "execute c",
                "rollback b",
                "rollback a"
            ]
        );
    }

    #[test]
    fn cancelled_before_start_runs_nothing() {
        let events = Arc::new(EventLog::default());
        let cancel = CancelToken::new();
        let mut op = Operation::new(Arc::new(NullReporter), cancel.clone());
        op.add_step(RecordingStep::ok("a", &events));
        cancel.cancel();

        let outcome = op.execute();

        assert_eq!(outcome, OperationOutcome::Cancelled);
        assert!(events.snapshot().is_empty());
    }

    #[test]
    fn spawn_reports_back_from_the_worker_thread() {
        let events = Arc::new(EventLog::default());
        let mut op = operation();
        op.add_step(RecordingStep::ok("a", &events));

        let handle = op.spawn().expect("spawn worker");
        let outcome = handle.join();

        assert!(outcome.success());
        assert_eq!(events.snapshot(), ["execute a"]);
    }

    #[test]
    fn progress_is_clamped_to_percent_range() {
        assert_eq!(progress_percent(0, 4), 0);
        assert_eq!(progress_percent(3, 4), 75);
        assert_eq!(progress_percent(0, 0), 100);
    }
}
