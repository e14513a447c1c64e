use std::sync::Arc;

use super::{
    camera_error::CameraError,
    frame::{Frame, PixelFormat},
    frame_source::FrameSource,
};
use crate::utils::now_millis;

/// Generates moving RGBA test patterns.
///
/// Reports not-ready for the first `warmup` polls to mimic a camera that
/// takes a moment to deliver its first frame.
#[derive(Debug, Clone)]
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    warmup: u32,
    polls: u32,
    phase: u8,
}

impl SyntheticFrameSource {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            warmup: 0,
            polls: 0,
            phase: 0,
        }
    }

    #[must_use]
    pub const fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup = polls;
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn is_ready(&mut self) -> bool {
        if self.polls < self.warmup {
            self.polls += 1;
            return false;
        }
        self.width > 0 && self.height > 0
    }

    #[allow(clippy::cast_possible_truncation)]
    fn current_frame(&mut self) -> Result<Frame, CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::NotFrame);
        }
        let tick = self.phase;
        self.phase = self.phase.wrapping_add(1);

        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                data.extend_from_slice(&[
                    x as u8 ^ tick,
                    y as u8 ^ tick,
                    x.wrapping_add(y) as u8 ^ tick,
                    u8::MAX,
                ]);
            }
        }
        Ok(Frame {
            width: self.width,
            height: self.height,
            timestamp_ms: now_millis(),
            format: PixelFormat::Rgba8,
            bytes: Arc::new(data),
        })
    }
}
