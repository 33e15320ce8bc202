/// Shared helpers for unit tests (compiled only under cfg(test))

use std::sync::{Arc, Mutex};

use crate::log::{Logger, LogEntry, LogSeverity};

/// Logger that captures entries for later inspection
///
/// Tests installing it must be `#[serial]`: the logger is process-global and
/// other tests keep logging while it is installed, so assertions should look
/// for specific entries rather than count all of them.
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    pub fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// True if any captured entry has the given severity and contains all fragments
pub fn has_entry(
    entries: &Arc<Mutex<Vec<LogEntry>>>,
    severity: LogSeverity,
    fragments: &[&str],
) -> bool {
    entries.lock().unwrap().iter().any(|entry| {
        entry.severity == severity && fragments.iter().all(|f| entry.message.contains(f))
    })
}
