use crate::log::log_level::LogLevel;

/// Represents a single log message event.
#[derive(Debug, Clone)]
pub struct LogMsg {
    /// The severity level of the log.
    pub level: LogLevel,
    /// Wall-clock timestamp of the event in milliseconds since the UNIX epoch.
    pub ts_ms: u128,
    /// The message content.
    pub text: String,
    /// Origin of the log, typically `module_path!()`.
    pub target: &'static str,
}

impl LogMsg {
    /// Creates a new `LogMsg` instance.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let msg = LogMsg::new(LogLevel::Info, "library ready", module_path!(), now_millis());
    /// ```
    pub fn new(
        level: LogLevel,
        text: impl Into<String>,
        target: &'static str,
        ts_ms: u128,
    ) -> Self {
        Self {
            level,
            ts_ms,
            text: text.into(),
            target,
        }
    }

    /// Renders the message the way it is written to the log file.
    #[must_use]
    pub fn format_line(&self) -> String {
        format!(
            "[{}] {} | {} | {}",
            self.level, self.ts_ms, self.target, self.text
        )
    }
}
