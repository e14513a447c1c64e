use std::fmt;

pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Debug, Clone, PartialEq)]
pub enum VisionError {
    /// The running library version does not offer this operation or shape.
    Unsupported { op: &'static str, reason: String },
    /// A native call failed.
    Call { op: &'static str, msg: String },
    /// A pixel buffer does not match the geometry it was declared with.
    InvalidBuffer { expected: usize, actual: usize },
}

impl VisionError {
    pub fn call(op: &'static str, msg: impl fmt::Display) -> Self {
        Self::Call {
            op,
            msg: msg.to_string(),
        }
    }

    /// Name of the native operation that failed.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Unsupported { op, .. } | Self::Call { op, .. } => op,
            Self::InvalidBuffer { .. } => "write_pixels",
        }
    }
}

impl fmt::Display for VisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { op, reason } => write!(f, "{op} unsupported: {reason}"),
            Self::Call { op, msg } => write!(f, "{op} failed: {msg}"),
            Self::InvalidBuffer { expected, actual } => {
                write!(f, "invalid pixel buffer: expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for VisionError {}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        Self::Call {
            op: "opencv",
            msg: err.to_string(),
        }
    }
}
