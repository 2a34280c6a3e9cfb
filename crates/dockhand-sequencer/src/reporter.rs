/// Sink for the progress and log events emitted while an operation runs.
///
/// Transport is the caller's concern: a terminal printer, a UI channel or a
/// test recorder all fit behind this trait. Events are emitted at step
/// start, step failure, rollback start, every per-step rollback attempt,
/// cleanup warnings, verification warnings and final completion.
pub trait Reporter: Send + Sync {
    fn log_message(&self, text: &str);

    /// `percent` is the share of the current phase already behind us.
    fn progress_updated(&self, percent: u8, text: &str);
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn log_message(&self, _text: &str) {}

    fn progress_updated(&self, _percent: u8, _text: &str) {}
}

/// Reporter that forwards events to the active `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log_message(&self, text: &str) {
        tracing::info!("{text}");
    }

    fn progress_updated(&self, percent: u8, text: &str) {
        tracing::info!(percent, "{text}");
    }
}
