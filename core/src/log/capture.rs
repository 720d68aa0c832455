use log::Level;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// A single structured log record
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub payload: Option<Value>,
}

/// In-memory sink recording everything written through a capturing [`super::Logger`].
/// Used by tests and the simulator to assert on the observable log sequence.
#[derive(Debug, Default)]
pub struct LogCapture {
    entries: Mutex<Vec<LogEntry>>,
}

impl LogCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Returns the first entry whose message starts with `prefix`
    pub fn find(&self, prefix: &str) -> Option<LogEntry> {
        self.entries.lock().iter().find(|e| e.message.starts_with(prefix)).cloned()
    }

    /// Index of the first entry whose message starts with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e.message.starts_with(prefix))
    }

    /// Returns the first entry whose message is exactly `message`
    pub fn find_exact(&self, message: &str) -> Option<LogEntry> {
        self.entries.lock().iter().find(|e| e.message == message).cloned()
    }

    pub fn count_exact(&self, message: &str) -> usize {
        self.entries.lock().iter().filter(|e| e.message == message).count()
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.position(prefix).is_some()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries.lock().iter().filter(|e| e.message.starts_with(prefix)).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(message: &str, payload: Option<Value>) -> LogEntry {
        LogEntry { level: Level::Info, message: message.to_string(), payload }
    }

    #[test]
    fn test_prefix_and_exact_lookups() {
        let capture = LogCapture::new();
        capture.record(entry("Fork recovery failed", Some(json!("undo failed"))));
        capture.record(entry("Fork", Some(json!({ "cause": 5 }))));
        capture.record(entry("Fork", Some(json!({ "cause": 1 }))));

        assert_eq!(capture.find("Fork").unwrap().message, "Fork recovery failed");
        assert_eq!(capture.count("Fork"), 3);
        assert_eq!(capture.find_exact("Fork").unwrap().payload, Some(json!({ "cause": 5 })));
        assert_eq!(capture.count_exact("Fork"), 2);
        assert!(capture.find_exact("Fork recovery").is_none());
    }
}
