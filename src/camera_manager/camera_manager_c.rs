//! Camera-backed [`FrameSource`] using OpenCV's `VideoCapture`.

use std::sync::Arc;

use opencv::{
    core::{self, AlgorithmHint},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};

use super::{
    camera_error::CameraError,
    frame::{Frame, PixelFormat},
    frame_source::FrameSource,
    utils::tight_bytes,
};
use crate::{log::log_sink::LogSink, sink_debug, sink_warn, utils::now_millis};

/// Owns one camera device and the last frame read from it.
///
/// `is_ready` grabs a fresh frame; `current_frame` converts that frame to
/// RGBA. The device is released when the manager is dropped.
pub struct CameraManager {
    cam: Option<VideoCapture>,
    pending: core::Mat,
    logger: Arc<dyn LogSink>,
    device_id: usize,
}

impl CameraManager {
    /// Opens camera `device_id`.
    ///
    /// # Errors
    ///
    /// Returns `CameraError::InvalidDeviceId` if the id does not fit OpenCV's
    /// index type, `CameraError::InitializationFailed` if the capture object
    /// can not be created and `CameraError::OpenFailed` if the device does not
    /// open.
    pub fn new(device_id: usize, logger: Arc<dyn LogSink>) -> Result<Self, CameraError> {
        let index =
            i32::try_from(device_id).map_err(|_| CameraError::InvalidDeviceId(device_id))?;
        let cam = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        if !cam.is_opened().unwrap_or(false) {
            return Err(CameraError::OpenFailed(device_id));
        }
        sink_debug!(logger, "[Camera] opened device {device_id}");

        Ok(Self {
            cam: Some(cam),
            pending: core::Mat::default(),
            logger,
            device_id,
        })
    }

    fn grab(&mut self) -> Result<(), CameraError> {
        let cam = self.cam.as_mut().ok_or(CameraError::CameraOff)?;
        let got = cam
            .read(&mut self.pending)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        if !got || self.pending.empty() || self.pending.cols() <= 0 || self.pending.rows() <= 0 {
            return Err(CameraError::NotFrame);
        }
        Ok(())
    }
}

impl FrameSource for CameraManager {
    fn is_ready(&mut self) -> bool {
        match self.grab() {
            Ok(()) => true,
            Err(CameraError::NotFrame) => false,
            Err(e) => {
                sink_warn!(self.logger, "[Camera] device {}: {e}", self.device_id);
                false
            }
        }
    }

    fn current_frame(&mut self) -> Result<Frame, CameraError> {
        if self.pending.empty() {
            return Err(CameraError::NotFrame);
        }
        let mut rgba = core::Mat::default();
        imgproc::cvt_color(
            &self.pending,
            &mut rgba,
            imgproc::COLOR_BGR2RGBA,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )?;
        let bytes = tight_bytes(&rgba)?;

        Ok(Frame {
            width: u32::try_from(rgba.cols()).unwrap_or(0),
            height: u32::try_from(rgba.rows()).unwrap_or(0),
            timestamp_ms: now_millis(),
            format: PixelFormat::Rgba8,
            bytes: Arc::new(bytes),
        })
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        if let Some(mut cam) = self.cam.take() {
            let _ = cam.release();
        }
    }
}
