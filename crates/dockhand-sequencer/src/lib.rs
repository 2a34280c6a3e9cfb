//! Transactional step sequencing with best-effort rollback.
//!
//! An [`Operation`] owns an ordered list of [`Step`]s and drives them one
//! after another. When a step fails or the caller requests cancellation,
//! every previously completed step is rolled back in reverse order; scratch
//! resources are then removed and the observable system state is re-checked.
//! Rollback, cleanup and verification are strictly best-effort: their
//! failures are logged through the [`Reporter`] and never change the
//! outcome of the run.

mod cancel;
mod operation;
mod reporter;
mod resources;
mod step;
mod verify;

pub use cancel::CancelToken;
pub use operation::{Operation, OperationHandle, OperationOutcome};
pub use reporter::{NullReporter, Reporter, TracingReporter};
pub use resources::ResourceRegistry;
pub use step::{Step, StepContext};
pub use verify::StateVerifier;
