use super::{camera_error::CameraError, frame::Frame};

/// Supplier of the most recent camera frame.
///
/// Callers must check [`FrameSource::is_ready`] before asking for
/// [`FrameSource::current_frame`]; readiness can regress at any time (device
/// reconfiguration, unplugged camera) and is re-checked on every tick.
pub trait FrameSource: Send {
    fn is_ready(&mut self) -> bool;

    /// # Errors
    /// Returns [`CameraError`] if no frame can be produced.
    fn current_frame(&mut self) -> Result<Frame, CameraError>;
}
