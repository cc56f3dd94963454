//! Logging abstraction for testable output.
//!
//! The sweep logs through a `Logger` trait object instead of global state,
//! so tests can assert on emitted events without parsing formatted output.

use std::io::Write;
use std::sync::{Arc, RwLock};

/// Severity of a log event, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Failed commands and other problems.
    Error,
    /// Normal progress output.
    Info,
    /// Statements and intermediate results.
    Debug,
    /// Full table dumps.
    Trace,
}

impl Level {
    /// Most verbose level shown for a numeric debug level.
    ///
    /// 0 is silent, 1 shows info, 2 debug, 3 and above trace.
    pub fn threshold(debug_level: u8) -> Option<Level> {
        match debug_level {
            0 => None,
            1 => Some(Level::Info),
            2 => Some(Level::Debug),
            _ => Some(Level::Trace),
        }
    }
}

/// Trait for logging output.
pub trait Logger: Send + Sync {
    /// Log a message at the given level.
    fn log(&self, level: Level, message: &str);

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }
}

/// Logger that writes to stderr.
#[derive(Debug)]
pub struct StderrLogger {
    threshold: Option<Level>,
}

impl StderrLogger {
    /// Create a logger showing everything up to `threshold` (`None` is silent).
    pub fn new(threshold: Option<Level>) -> Self {
        Self { threshold }
    }

    /// Create a logger for a numeric debug level.
    pub fn from_debug_level(debug_level: u8) -> Self {
        Self::new(Level::threshold(debug_level))
    }

    /// Whether messages at `level` are written.
    pub fn enabled(&self, level: Level) -> bool {
        self.threshold.is_some_and(|max| level <= max)
    }
}

impl Logger for StderrLogger {
    fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = match level {
            Level::Error => writeln!(stderr, "error: {}", message),
            _ => writeln!(stderr, "{}", message),
        };
    }
}

/// A captured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Mock logger for testing that captures all messages.
/// Cloning creates a new handle to the same captured entries.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured log entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().unwrap().clone()
    }

    /// Get all captured messages (just the text).
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }

    /// Get messages at a specific level.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Check if any message contains the given substring.
    pub fn contains(&self, substring: &str) -> bool {
        self.messages().iter().any(|m| m.contains(substring))
    }

    /// Get count of captured messages.
    pub fn count(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

impl Logger for MockLogger {
    fn log(&self, level: Level, message: &str) {
        self.entries.write().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }
}

/// A no-op logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str) {}
}
