use std::sync::{Arc, Mutex, mpsc::Sender};

/// Receives one human-readable status message per tick. Fire-and-forget.
pub trait StatusReporter: Send {
    fn report(&self, message: &str);
}

/// Prints a status line whenever the message changes.
#[derive(Debug, Default)]
pub struct StdoutStatusReporter {
    last: Mutex<Option<String>>,
}

impl StdoutStatusReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusReporter for StdoutStatusReporter {
    fn report(&self, message: &str) {
        if let Ok(mut last) = self.last.lock() {
            if last.as_deref() == Some(message) {
                return;
            }
            *last = Some(message.to_owned());
        }
        println!("{message}");
    }
}

/// Forwards every message over a channel; a closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelStatusReporter {
    tx: Sender<String>,
}

impl ChannelStatusReporter {
    #[must_use]
    pub const fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl StatusReporter for ChannelStatusReporter {
    fn report(&self, message: &str) {
        let _ = self.tx.send(message.to_owned());
    }
}

/// Keeps the most recent message; clones share it.
#[derive(Debug, Clone, Default)]
pub struct LatestStatus {
    inner: Arc<Mutex<Option<String>>>,
}

impl LatestStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }
}

impl StatusReporter for LatestStatus {
    fn report(&self, message: &str) {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = Some(message.to_owned());
        }
    }
}
