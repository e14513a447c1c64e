//! Boundary to the native vision library.
//!
//! [`VisionBinding`] is the capability set the detection engine needs;
//! [`native::Native`] guards give every allocated handle exactly one release.
pub mod native;
#[cfg(feature = "opencv")]
pub mod opencv_binding;
pub mod scripted_binding;
pub mod vision_binding;
pub mod vision_error;

pub use native::{Native, ScopedVision};
#[cfg(feature = "opencv")]
pub use opencv_binding::OpenCvBinding;
pub use scripted_binding::ScriptedBinding;
pub use vision_binding::{ColorConversion, NativeObject, RawDetections, RefineConfig, VisionBinding};
pub use vision_error::VisionError;
