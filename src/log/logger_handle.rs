use std::sync::mpsc;

use crate::{
    log::{log_level::LogLevel, log_msg::LogMsg, log_sink::LogSink},
    utils::now_millis,
};

/// Lightweight, cloneable handle to the process logger.
///
/// Enqueues `LogMsg` into the logger's bounded channel. Never blocks: when
/// the queue is full the record is dropped, so a slow disk can not stall the
/// detection tick.
#[derive(Clone)]
pub struct LoggerHandle {
    pub(super) tx: mpsc::SyncSender<LogMsg>,
}

impl LogSink for LoggerHandle {
    #[inline]
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        let _ = self.try_log(level, msg, target);
    }
}

impl LoggerHandle {
    /// Attempts to enqueue a log message without blocking.
    ///
    /// # Errors
    /// - `TrySendError::Full` when the bounded queue is at capacity.
    /// - `TrySendError::Disconnected` when the logger worker is gone.
    pub fn try_log<S: Into<String>>(
        &self,
        level: LogLevel,
        text: S,
        target: &'static str,
    ) -> Result<(), mpsc::TrySendError<LogMsg>> {
        self.tx
            .try_send(LogMsg::new(level, text, target, now_millis()))
    }
}
