use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a caller and a running
/// operation.
///
/// The caller keeps one clone and calls [`CancelToken::cancel`]; the
/// sequencer polls [`CancelToken::is_cancelled`] at step boundaries. The
/// flag only ever transitions from `false` to `true`. Steps that block on
/// long-running external work are expected to poll the token themselves if
/// they want to be responsive mid-step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// A step already in progress is not interrupted; the sequencer stops
    /// before starting the next one.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
