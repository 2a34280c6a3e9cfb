use crate::cancel::CancelToken;
use crate::reporter::Reporter;
use crate::resources::ResourceRegistry;

/// Shared facilities handed to a step at call time.
///
/// Steps never hold a reference back to the operation that owns them; the
/// reporter, cancellation token and resource registry arrive through this
/// context instead, which keeps every step independently testable.
pub struct StepContext<'a> {
    reporter: &'a dyn Reporter,
    cancel: &'a CancelToken,
    resources: &'a ResourceRegistry,
}

impl<'a> StepContext<'a> {
    #[must_use]
    pub fn new(
        reporter: &'a dyn Reporter,
        cancel: &'a CancelToken,
        resources: &'a ResourceRegistry,
    ) -> Self {
        Self {
            reporter,
            cancel,
            resources,
        }
    }

    #[must_use]
    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        self.cancel
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceRegistry {
        self.resources
    }

    /// Shorthand for logging through the reporter.
    pub fn log(&self, text: &str) {
        self.reporter.log_message(text);
    }
}

/// A single reversible unit of work inside an [`Operation`](crate::Operation).
///
/// `execute` performs an external side effect; `rollback` undoes it on a
/// best-effort basis. The owning operation only ever invokes `rollback` on
/// a step whose `execute` previously returned `Ok`.
pub trait Step: Send {
    /// Error produced when executing or rolling back fails.
    type Error;

    /// Human-readable label used in logs and progress updates.
    fn description(&self) -> &str;

    /// Perform the step's side effect.
    ///
    /// Anything this changes beyond what `rollback` can reverse is a bug in
    /// the step, not in the sequencer.
    ///
    /// # Errors
    ///
    /// Returns an error when the side effect could not be applied; the
    /// owning operation then rolls back every previously completed step.
    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<(), Self::Error>;

    /// Undo the effect of a prior successful `execute`.
    ///
    /// The default implementation does nothing, which suits steps without a
    /// lasting effect.
    ///
    /// # Errors
    ///
    /// May fail; the owning operation logs a warning and moves on to the
    /// next rollback rather than propagating it.
    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<(), Self::Error> {
        let _ = ctx;
        Ok(())
    }

    /// Advisory pre-flight check, run immediately before `execute`.
    ///
    /// # Errors
    ///
    /// A failure here is logged and does not stop the operation.
    fn check_prerequisites(&self, ctx: &StepContext<'_>) -> Result<(), Self::Error> {
        let _ = ctx;
        Ok(())
    }

    /// Advisory check that the step left the system in the expected state,
    /// run immediately after a successful `execute`.
    ///
    /// # Errors
    ///
    /// A failure here is logged and does not stop the operation.
    fn verify_completion(&self, ctx: &StepContext<'_>) -> Result<(), Self::Error> {
        let _ = ctx;
        Ok(())
    }
}
