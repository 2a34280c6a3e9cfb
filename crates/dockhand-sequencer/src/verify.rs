/// Coarse post-rollback check of observable system state.
///
/// Verification is advisory: whatever it finds is logged as warnings and
/// never changes the outcome of the operation.
pub trait StateVerifier: Send {
    /// Capture a baseline of the relevant state before the run starts.
    fn capture_baseline(&mut self) {}

    /// Re-check the state after rollback. Each returned string is logged as
    /// a warning by the sequencer.
    fn verify(&mut self) -> Vec<String>;
}
