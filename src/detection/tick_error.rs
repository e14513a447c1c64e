use std::fmt;

use crate::{camera_manager::PixelFormat, vision::VisionError};

/// Failure outside the per-dictionary search; aborts the current tick only.
#[derive(Debug, Clone, PartialEq)]
pub enum TickError {
    UnsupportedFormat(PixelFormat),
    Vision(VisionError),
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(format) => {
                write!(f, "frame format {format:?} can not be materialized as RGBA")
            }
            Self::Vision(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TickError {}

impl From<VisionError> for TickError {
    fn from(err: VisionError) -> Self {
        Self::Vision(err)
    }
}
