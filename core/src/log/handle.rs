use super::capture::{LogCapture, LogEntry};
use log::Level;
use serde::Serialize;
use std::{fmt::Display, sync::Arc};

/// Logging capability handed to components. Writes to the global `log` facade under a fixed
/// target, and mirrors every record into an optional [`LogCapture`].
#[derive(Clone, Debug)]
pub struct Logger {
    target: &'static str,
    capture: Option<Arc<LogCapture>>,
}

impl Logger {
    pub fn new(target: &'static str) -> Self {
        Self { target, capture: None }
    }

    pub fn with_capture(target: &'static str, capture: Arc<LogCapture>) -> Self {
        Self { target, capture: Some(capture) }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn trace(&self, message: impl Display) {
        self.write(Level::Trace, message.to_string(), None);
    }

    pub fn debug(&self, message: impl Display) {
        self.write(Level::Debug, message.to_string(), None);
    }

    pub fn info(&self, message: impl Display) {
        self.write(Level::Info, message.to_string(), None);
    }

    pub fn warn(&self, message: impl Display) {
        self.write(Level::Warn, message.to_string(), None);
    }

    pub fn error(&self, message: impl Display) {
        self.write(Level::Error, message.to_string(), None);
    }

    /// Logs `message` along with a structured payload, rendered as JSON on the text sink
    pub fn event<P: Serialize + ?Sized>(&self, level: Level, message: impl Display, payload: &P) {
        self.write(level, message.to_string(), serde_json::to_value(payload).ok());
    }

    fn write(&self, level: Level, message: String, payload: Option<serde_json::Value>) {
        match &payload {
            Some(payload) => log::log!(target: self.target, level, "{} {}", message, payload),
            None => log::log!(target: self.target, level, "{}", message),
        }
        if let Some(capture) = &self.capture {
            capture.record(LogEntry { level, message, payload });
        }
    }
}
