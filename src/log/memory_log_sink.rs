use std::sync::Mutex;

use crate::log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink};
use crate::utils::now_millis;

/// Sink that keeps every record in memory.
///
/// Used by tests to assert on what a component reported, and by the binary
/// to keep the last few problems around for the final summary.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    records: Mutex<Vec<LogMsg>>,
}

impl MemoryLogSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all records logged so far, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<LogMsg> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Counts records at exactly `level`.
    #[must_use]
    pub fn count(&self, level: LogLevel) -> usize {
        self.records
            .lock()
            .map(|guard| guard.iter().filter(|m| m.level == level).count())
            .unwrap_or(0)
    }

    /// True if any record at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .any(|m| m.level == level && m.text.contains(needle))
            })
            .unwrap_or(false)
    }
}

impl LogSink for MemoryLogSink {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(LogMsg::new(level, msg, target, now_millis()));
        }
    }
}
