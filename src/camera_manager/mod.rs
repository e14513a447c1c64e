//! Frame sources: the camera feed (OpenCV `VideoCapture`) and a synthetic
//! generator for running without a device.
pub mod camera_error;
#[cfg(feature = "opencv")]
pub mod camera_manager_c;
pub mod frame;
pub mod frame_source;
pub mod synthetic_source;
#[cfg(feature = "opencv")]
pub mod utils;

pub use camera_error::CameraError;
#[cfg(feature = "opencv")]
pub use camera_manager_c::CameraManager;
pub use frame::{Frame, PixelFormat};
pub use frame_source::FrameSource;
pub use synthetic_source::SyntheticFrameSource;
