use std::fmt;

/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Per-dictionary search steps and other per-tick chatter.
    Trace,
    /// Events useful while debugging the detection loop.
    Debug,
    /// Coarse-grained lifecycle progress (library ready, dictionary discovered).
    Info,
    /// Recoverable failures, e.g. a native call failing for one dictionary.
    Warn,
    /// A tick aborted, or a collaborator never became available.
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// True for levels that are always surfaced to the operator.
    #[must_use]
    pub const fn is_problem(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
