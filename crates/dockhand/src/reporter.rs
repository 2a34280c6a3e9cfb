use dockhand_sequencer::Reporter;

/// Prints the operation's log and progress stream to stdout.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn log_message(&self, text: &str) {
        println!("{text}");
    }

    fn progress_updated(&self, percent: u8, text: &str) {
        println!("[{percent:>3}%] {text}");
    }
}
